// src/pipeline/health.rs

//! Visibility refresh pass.
//!
//! Re-checks whether active topics are still visible to anonymous
//! visitors, recording deleted/hidden transitions. Runs before the
//! first-post check so the selection pool reflects fresh visibility.

use chrono::Utc;

use crate::error::Result;
use crate::messaging::Publisher;
use crate::models::{Config, TopicId};
use crate::pipeline::{CycleStats, note_transient};
use crate::services::{FetchOutcome, Fetcher, check_visibility};
use crate::storage::TopicStore;

/// Refresh visibility for the topics most due a check.
pub async fn run_visibility_refresh(
    config: &Config,
    fetcher: &dyn Fetcher,
    store: &dyn TopicStore,
    publisher: &dyn Publisher,
    stats: &mut CycleStats,
) -> Result<()> {
    let due = store.active_topics(config.visibility.batch_limit).await?;
    log::info!("visibility refresh: {} topics due", due.len());

    for topic_id in due {
        if stats.budget_exceeded(config.fetcher.transient_failure_budget) {
            log::warn!("transient-failure budget spent, aborting visibility refresh");
            break;
        }
        refresh_topic(fetcher, store, publisher, stats, topic_id).await;
    }

    Ok(())
}

/// Check and persist the visibility of a single topic.
///
/// Unreachable topics only count toward the transient budget; no record
/// is written for them and they are retried next cycle.
pub async fn refresh_topic(
    fetcher: &dyn Fetcher,
    store: &dyn TopicStore,
    publisher: &dyn Publisher,
    stats: &mut CycleStats,
    topic_id: TopicId,
) {
    let content = match fetcher.fetch(topic_id).await {
        FetchOutcome::Success(content) => content,
        FetchOutcome::Transient(reason) => {
            note_transient(publisher, stats, topic_id, &reason).await;
            return;
        }
    };

    let status = check_visibility(&content);
    log::info!("topic {} is {}", topic_id, status);

    if !status.is_persistable() {
        stats.transient_failures += 1;
        return;
    }

    match store.replace_visibility(topic_id, status, Utc::now()).await {
        Ok(()) => stats.visibility_updates += 1,
        Err(e) => {
            log::warn!("visibility update failed for topic {}: {}", topic_id, e);
            stats.persistence_failures += 1;
        }
    }
}
