// src/models/topic.rs

//! Topic data structures: tracked topics, snapshots and lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque numeric forum topic identifier (`viewtopic.php?t=<id>`).
pub type TopicId = u64;

/// Lifecycle status of a search, inferred from the topic title.
///
/// Serialized with the short labels used by the downstream
/// topic-management consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    /// Search is ongoing (Ищем), the default state, never reported.
    #[serde(rename = "Ищем")]
    Searching,

    /// Person found alive (НЖ)
    #[serde(rename = "НЖ")]
    FoundAlive,

    /// Person found deceased (НП)
    #[serde(rename = "НП")]
    FoundDeceased,

    /// Search completed (Завершен)
    #[serde(rename = "Завершен")]
    Completed,
}

impl SearchStatus {
    /// Short label as used in pub/sub payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Searching => "Ищем",
            SearchStatus::FoundAlive => "НЖ",
            SearchStatus::FoundDeceased => "НП",
            SearchStatus::Completed => "Завершен",
        }
    }

    /// Whether a transition to this status is reported downstream.
    ///
    /// `Searching` is the steady state of every active topic and is never
    /// reported.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, SearchStatus::Searching)
    }
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a topic as seen by an anonymous forum visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicVisibility {
    /// Topic is visible to everyone.
    Regular,

    /// Topic requires authorization to view.
    Hidden,

    /// Topic was permanently deleted.
    Deleted,

    /// Upstream answered with a gateway error; retried next cycle.
    Unreachable,
}

impl TopicVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicVisibility::Regular => "regular",
            TopicVisibility::Hidden => "hidden",
            TopicVisibility::Deleted => "deleted",
            TopicVisibility::Unreachable => "unreachable",
        }
    }

    /// `Unreachable` is a per-check outcome, never written to storage.
    pub fn is_persistable(&self) -> bool {
        !matches!(self, TopicVisibility::Unreachable)
    }
}

impl std::fmt::Display for TopicVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topic registered for tracking.
///
/// Created when a search first appears upstream; never deleted, only marked
/// hidden/deleted through its [`VisibilityRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedTopic {
    /// Forum topic id
    pub topic_id: TopicId,

    /// When the search was started on the forum
    pub start_time: DateTime<Utc>,

    /// Forum folder (region) the topic belongs to
    pub folder_id: u32,
}

/// One row of the candidate-selection projection.
///
/// Assembled by the storage backend by joining tracked topics with their
/// current snapshot and folder popularity counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRow {
    pub topic_id: TopicId,

    /// Search start time
    pub start_time: DateTime<Utc>,

    /// Timestamp of the current snapshot; `None` if never checked
    pub last_checked: Option<DateTime<Utc>>,

    /// Number of topics sharing the folder; `None` if unknown
    pub folder_count: Option<u32>,

    /// Check counter of the current snapshot; `None` if never checked
    pub checks_made: Option<u32>,
}

impl TopicRow {
    /// Last-checked time with the sentinel minimum substituted for blanks,
    /// so never-checked topics sort as most overdue.
    pub fn last_checked_or_min(&self) -> DateTime<Utc> {
        self.last_checked.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Folder popularity with the default of 1 substituted for blanks.
    pub fn folder_count_or_default(&self) -> u32 {
        self.folder_count.unwrap_or(1)
    }

    /// Check counter with the default of 1 substituted for blanks.
    pub fn checks_or_default(&self) -> u32 {
        self.checks_made.unwrap_or(1)
    }
}

/// A stored first-post snapshot.
///
/// History is append-only: at most one snapshot per topic has
/// `actual = true`; superseded rows are flipped to `false`, never removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirstPostSnapshot {
    pub topic_id: TopicId,

    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Whether this is the current snapshot for the topic
    pub actual: bool,

    /// Hex-encoded fingerprint of the normalized content
    pub content_hash: String,

    /// Normalized first-post content
    pub content: String,

    /// How many times this snapshot was re-confirmed unchanged
    pub num_of_checks: u32,
}

/// The single logical visibility row for a topic.
///
/// Replaced wholesale (delete-then-insert) on every successful check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibilityRecord {
    pub topic_id: TopicId,
    pub timestamp: DateTime<Utc>,
    pub status: TopicVisibility,
}
