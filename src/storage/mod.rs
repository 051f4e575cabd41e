// src/storage/mod.rs

//! Storage abstractions for topic persistence.
//!
//! The core operates on transient projections of three record families:
//! tracked topics, first-post snapshots (append-only history with an
//! is-current flag) and visibility records (one logical row per topic,
//! replaced wholesale). Production deployments back this trait with a
//! relational store; [`LocalStore`] keeps everything in a JSON file tree
//! for local runs and tests.

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{FirstPostSnapshot, TopicId, TopicRow, TopicVisibility, TrackedTopic};

// Re-export for convenience
pub use local::LocalStore;

/// Trait for topic storage backends.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Register or update a tracked topic.
    async fn upsert_topic(&self, topic: TrackedTopic) -> Result<()>;

    /// Selection projection for the candidate selector: all active topics
    /// joined with their current snapshot and folder popularity counts,
    /// excluding topics already known deleted or hidden.
    async fn selection_rows(&self) -> Result<Vec<TopicRow>>;

    /// Topics due for a visibility refresh: never-checked topics first,
    /// then the stalest non-deleted ones, bounded by `limit` once the
    /// stale portion starts filling up.
    async fn active_topics(&self, limit: usize) -> Result<Vec<TopicId>>;

    /// The current snapshot for a topic, if any.
    async fn current_snapshot(&self, topic_id: TopicId) -> Result<Option<FirstPostSnapshot>>;

    /// Insert a snapshot as current, retiring any previous current rows
    /// for the same topic. History is never overwritten.
    async fn insert_snapshot(&self, snapshot: FirstPostSnapshot) -> Result<()>;

    /// Increment the check counter on the current snapshot.
    async fn bump_check_count(&self, topic_id: TopicId) -> Result<()>;

    /// Replace the visibility row for a topic (delete-then-insert).
    async fn replace_visibility(
        &self,
        topic_id: TopicId,
        status: TopicVisibility,
        timestamp: DateTime<Utc>,
    ) -> Result<()>;
}
