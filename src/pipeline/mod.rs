// src/pipeline/mod.rs

//! Batch passes run on every invocation.
//!
//! - `run_visibility_refresh`: re-check whether active topics are still
//!   visible (deleted/hidden tracking)
//! - `run_first_post_check`: detect first-post content changes and status
//!   transitions for a weighted sample of active topics
//!
//! Both passes share one [`CycleStats`] value threaded through the calls;
//! there is no process-wide mutable state. Exceeding the transient-failure
//! budget aborts the remainder of a pass deliberately.

pub mod check;
pub mod health;
pub mod select;

pub use check::run_first_post_check;
pub use health::run_visibility_refresh;
pub use select::select_candidates;

use crate::error::Result;
use crate::messaging::{Publisher, notify_admin};
use crate::models::{Config, TopicId};
use crate::services::Fetcher;
use crate::storage::TopicStore;

/// Counters for one invocation, reset at the start of each cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Timeouts, connection failures and gateway-error pages
    pub transient_failures: u32,
    /// First posts fetched and fingerprinted
    pub first_posts_checked: usize,
    /// First posts whose fingerprint changed
    pub first_posts_changed: usize,
    /// Visibility rows written
    pub visibility_updates: usize,
    /// Normalizations that ran with a missing marker
    pub degraded_normalizations: usize,
    /// Per-topic persistence errors (logged and skipped)
    pub persistence_failures: usize,
}

impl CycleStats {
    /// Whether the transient-failure budget for this cycle is spent.
    pub fn budget_exceeded(&self, budget: u32) -> bool {
        self.transient_failures > budget
    }
}

/// Run one full cycle: visibility refresh, then the first-post check.
pub async fn run_cycle(
    config: &Config,
    fetcher: &dyn Fetcher,
    store: &dyn TopicStore,
    publisher: &dyn Publisher,
) -> Result<CycleStats> {
    let mut stats = CycleStats::default();

    run_visibility_refresh(config, fetcher, store, publisher, &mut stats).await?;
    run_first_post_check(config, fetcher, store, publisher, &mut stats).await?;

    if stats.budget_exceeded(config.fetcher.transient_failure_budget) {
        notify_admin(
            publisher,
            &format!(
                "[topicwatch]: Bad Gateway {} times",
                stats.transient_failures
            ),
        )
        .await;
    }

    Ok(stats)
}

/// Count a fetch-level transient failure and alert the admin channel.
pub(crate) async fn note_transient(
    publisher: &dyn Publisher,
    stats: &mut CycleStats,
    topic_id: TopicId,
    reason: &str,
) {
    stats.transient_failures += 1;
    log::info!(
        "transient failure for topic {}: {} ({} this cycle)",
        topic_id,
        reason,
        stats.transient_failures
    );
    notify_admin(
        publisher,
        &format!("[topicwatch]: {} for topic {}", reason, topic_id),
    )
    .await;
}
