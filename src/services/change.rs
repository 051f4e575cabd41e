// src/services/change.rs

//! Content fingerprinting and snapshot transition logic.
//!
//! The fingerprint is a change-detection heuristic over normalized text,
//! not a security boundary, so a 128-bit MD5 digest is sufficient at this
//! scale.

use md5::{Digest, Md5};

use crate::models::FirstPostSnapshot;

/// Hex-encoded 128-bit fingerprint of canonical content.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Md5::digest(text.as_bytes()))
}

/// What to do with the snapshot history after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotAction {
    /// First-ever check: insert the initial snapshot with counter 1.
    InsertInitial,

    /// Content changed: retire the current snapshot, insert a new current
    /// one with counter 1.
    Replace,

    /// Content unchanged: increment the counter on the current snapshot.
    Bump,
}

/// Decide the snapshot transition for a freshly computed fingerprint.
pub fn snapshot_action(current: Option<&FirstPostSnapshot>, new_hash: &str) -> SnapshotAction {
    match current {
        None => SnapshotAction::InsertInitial,
        Some(snapshot) if snapshot.content_hash != new_hash => SnapshotAction::Replace,
        Some(_) => SnapshotAction::Bump,
    }
}
