// src/models/mod.rs

//! Domain models for the topic watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod topic;

// Re-export all public types
pub use config::{Config, FetcherConfig, SelectionConfig, SelectionWeights, VisibilityConfig};
pub use topic::{
    FirstPostSnapshot, SearchStatus, TopicId, TopicRow, TopicVisibility, TrackedTopic,
    VisibilityRecord,
};
