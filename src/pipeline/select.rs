// src/pipeline/select.rs

//! Candidate selection for the first-post check pass.
//!
//! Out of the whole active population, only a fraction is checked per
//! cycle (to bound invocation cost). The batch is assembled from five
//! weighted, independently-sorted criteria rather than one blended score:
//! each criterion is an operator-tunable quota, which keeps the sampling
//! interpretable.
//!
//! 1. `start_time`: freshest searches first
//! 2. `upd_time`: longest-unchecked first (never-checked sort as oldest)
//! 3. `folder_weight`: most popular regions first
//! 4. `checks_made`: fewest prior checks first
//! 5. `random`: uniform shuffle, covering whatever the others miss

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::{SelectionWeights, TopicId, TopicRow};

/// Select which topics to check next, deduplicated, in pick order.
///
/// `percent` is the fraction of the population checked this cycle;
/// each criterion then contributes up to `round(weight/100 * target)`
/// topics not already picked by an earlier criterion. A small population
/// simply leaves later quotas unfilled.
pub fn select_candidates<R: Rng + ?Sized>(
    rows: &[TopicRow],
    percent: f64,
    weights: &SelectionWeights,
    rng: &mut R,
) -> Vec<TopicId> {
    if percent <= 0.0 || rows.is_empty() {
        return Vec::new();
    }

    let target = (rows.len() as f64 * percent / 100.0).round() as usize;

    let mut order: Vec<&TopicRow> = rows.iter().collect();
    let mut picked = Vec::new();
    let mut seen = HashSet::new();

    // 1. freshest start time first
    order.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    take(&order, quota(weights.start_time, target), &mut picked, &mut seen);

    // 2. oldest previous check first
    order.sort_by_key(|r| r.last_checked_or_min());
    take(&order, quota(weights.upd_time, target), &mut picked, &mut seen);

    // 3. most popular folder first
    order.sort_by(|a, b| b.folder_count_or_default().cmp(&a.folder_count_or_default()));
    take(&order, quota(weights.folder_weight, target), &mut picked, &mut seen);

    // 4. fewest prior checks first
    order.sort_by_key(|r| r.checks_or_default());
    take(&order, quota(weights.checks_made, target), &mut picked, &mut seen);

    // 5. uniform random remainder
    order.shuffle(rng);
    take(&order, quota(weights.random, target), &mut picked, &mut seen);

    picked
}

/// Per-criterion quota for a given target batch size.
fn quota(weight: f64, target: usize) -> usize {
    (weight / 100.0 * target as f64).round() as usize
}

/// Walk a sorted order, picking up to `quota` topics not yet selected.
fn take(
    order: &[&TopicRow],
    quota: usize,
    picked: &mut Vec<TopicId>,
    seen: &mut HashSet<TopicId>,
) {
    let mut remaining = quota;
    for row in order {
        if remaining == 0 {
            break;
        }
        if seen.insert(row.topic_id) {
            picked.push(row.topic_id);
            remaining -= 1;
        }
    }
}
