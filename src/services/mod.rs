// src/services/mod.rs

//! Content services: fetching, normalization, change detection and
//! classification of forum topic pages.

pub mod change;
pub mod fetch;
pub mod normalize;
pub mod status;
pub mod visibility;

pub use change::{SnapshotAction, fingerprint, snapshot_action};
pub use fetch::{FetchOutcome, Fetcher, TopicFetcher};
pub use normalize::{Normalized, normalize};
pub use status::{classify_status, classify_title, extract_title};
pub use visibility::check_visibility;
