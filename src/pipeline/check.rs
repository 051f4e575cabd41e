// src/pipeline/check.rs

//! First-post check pass.
//!
//! Walks the selected candidates strictly in pick order, one blocking
//! fetch at a time: fetch → screen visibility → classify status →
//! normalize → fingerprint → snapshot transition. Every topic's update is
//! committed independently, so a crash mid-batch leaves partial progress
//! that the staleness-biased selector re-discovers next cycle.

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

use crate::error::Result;
use crate::messaging::{CHANNEL_FIRST_POST_PROCESSING, CHANNEL_TOPIC_MANAGEMENT, Publisher, publish_message};
use crate::models::{Config, FirstPostSnapshot, TopicId, TopicVisibility};
use crate::pipeline::{CycleStats, note_transient, select_candidates};
use crate::services::{
    FetchOutcome, Fetcher, SnapshotAction, check_visibility, classify_status, fingerprint,
    normalize, snapshot_action,
};
use crate::storage::TopicStore;

/// Check the first posts of a weighted sample of active topics.
pub async fn run_first_post_check(
    config: &Config,
    fetcher: &dyn Fetcher,
    store: &dyn TopicStore,
    publisher: &dyn Publisher,
    stats: &mut CycleStats,
) -> Result<()> {
    let rows = store.selection_rows().await?;
    let mut rng = StdRng::from_os_rng();
    let candidates = select_candidates(
        &rows,
        config.selection.percent,
        &config.selection.weights,
        &mut rng,
    );
    log::info!(
        "first-post check: {} candidates out of {} active topics",
        candidates.len(),
        rows.len()
    );

    let mut changed = Vec::new();

    for topic_id in candidates {
        if stats.budget_exceeded(config.fetcher.transient_failure_budget) {
            log::warn!("transient-failure budget spent, aborting first-post check");
            break;
        }

        let content = match fetcher.fetch(topic_id).await {
            FetchOutcome::Success(content) => content,
            FetchOutcome::Transient(reason) => {
                note_transient(publisher, stats, topic_id, &reason).await;
                continue;
            }
        };

        match check_visibility(&content) {
            TopicVisibility::Unreachable => {
                stats.transient_failures += 1;
                log::info!("gateway error page for topic {}", topic_id);
                continue;
            }
            status @ (TopicVisibility::Deleted | TopicVisibility::Hidden) => {
                log::info!("topic {} is {}", topic_id, status);
                match store.replace_visibility(topic_id, status, Utc::now()).await {
                    Ok(()) => stats.visibility_updates += 1,
                    Err(e) => {
                        log::warn!("visibility update failed for topic {}: {}", topic_id, e);
                        stats.persistence_failures += 1;
                    }
                }
                continue;
            }
            TopicVisibility::Regular => {}
        }

        stats.first_posts_checked += 1;

        if let Some(status) = classify_status(&content) {
            if status.is_reportable() {
                log::info!("status transition for topic {}: {}", topic_id, status);
                publish_message(
                    publisher,
                    CHANNEL_TOPIC_MANAGEMENT,
                    json!({ "topic_id": topic_id, "status": status }),
                )
                .await;
            }
        }

        let normalized = normalize(&content);
        if normalized.degraded {
            stats.degraded_normalizations += 1;
        }
        let hash = fingerprint(&normalized.text);

        match apply_snapshot(store, topic_id, hash, normalized.text).await {
            Ok(true) => {
                changed.push(topic_id);
                stats.first_posts_changed += 1;
            }
            Ok(false) => {}
            Err(e) => {
                log::warn!("snapshot update failed for topic {}: {}", topic_id, e);
                stats.persistence_failures += 1;
            }
        }
    }

    if !changed.is_empty() {
        publish_message(publisher, CHANNEL_FIRST_POST_PROCESSING, json!(changed)).await;
    }

    Ok(())
}

/// Apply the snapshot transition for a fresh fingerprint.
///
/// Returns `true` when an existing snapshot was superseded (the only case
/// reported downstream; first-ever snapshots are not).
async fn apply_snapshot(
    store: &dyn TopicStore,
    topic_id: TopicId,
    hash: String,
    content: String,
) -> Result<bool> {
    let current = store.current_snapshot(topic_id).await?;

    match snapshot_action(current.as_ref(), &hash) {
        SnapshotAction::InsertInitial => {
            store
                .insert_snapshot(new_snapshot(topic_id, hash, content))
                .await?;
            Ok(false)
        }
        SnapshotAction::Replace => {
            store
                .insert_snapshot(new_snapshot(topic_id, hash, content))
                .await?;
            Ok(true)
        }
        SnapshotAction::Bump => {
            store.bump_check_count(topic_id).await?;
            Ok(false)
        }
    }
}

fn new_snapshot(topic_id: TopicId, hash: String, content: String) -> FirstPostSnapshot {
    FirstPostSnapshot {
        topic_id,
        timestamp: Utc::now(),
        actual: true,
        content_hash: hash,
        content,
        num_of_checks: 1,
    }
}
