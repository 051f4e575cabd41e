// src/storage/local.rs

//! Local filesystem storage implementation.
//!
//! Keeps the three record families in a small JSON file tree for
//! development and testing. Production deployments should back
//! [`TopicStore`] with a relational store.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml        # Watcher configuration
//! ├── topics.json        # Tracked topics
//! ├── snapshots.json     # First-post snapshot history (append-only)
//! └── visibility.json    # One visibility row per topic
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{
    FirstPostSnapshot, TopicId, TopicRow, TopicVisibility, TrackedTopic, VisibilityRecord,
};
use crate::storage::TopicStore;

const TOPICS_KEY: &str = "topics.json";
const SNAPSHOTS_KEY: &str = "snapshots.json";
const VISIBILITY_KEY: &str = "visibility.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data, defaulting to an empty collection when missing.
    async fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(T::default()),
        }
    }

    async fn load_topics(&self) -> Result<Vec<TrackedTopic>> {
        self.read_json(TOPICS_KEY).await
    }

    async fn load_snapshots(&self) -> Result<Vec<FirstPostSnapshot>> {
        self.read_json(SNAPSHOTS_KEY).await
    }

    async fn load_visibility(&self) -> Result<Vec<VisibilityRecord>> {
        self.read_json(VISIBILITY_KEY).await
    }

    /// Latest visibility status per topic.
    fn visibility_map(records: &[VisibilityRecord]) -> HashMap<TopicId, TopicVisibility> {
        records.iter().map(|r| (r.topic_id, r.status)).collect()
    }
}

#[async_trait]
impl TopicStore for LocalStore {
    async fn upsert_topic(&self, topic: TrackedTopic) -> Result<()> {
        let mut topics = self.load_topics().await?;
        topics.retain(|t| t.topic_id != topic.topic_id);
        topics.push(topic);
        topics.sort_by_key(|t| t.topic_id);
        self.write_json(TOPICS_KEY, &topics).await
    }

    async fn selection_rows(&self) -> Result<Vec<TopicRow>> {
        let topics = self.load_topics().await?;
        let snapshots = self.load_snapshots().await?;
        let visibility = Self::visibility_map(&self.load_visibility().await?);

        let mut folder_counts: HashMap<u32, u32> = HashMap::new();
        for topic in &topics {
            *folder_counts.entry(topic.folder_id).or_default() += 1;
        }

        let current: HashMap<TopicId, &FirstPostSnapshot> = snapshots
            .iter()
            .filter(|s| s.actual)
            .map(|s| (s.topic_id, s))
            .collect();

        let rows = topics
            .iter()
            .filter(|t| {
                !matches!(
                    visibility.get(&t.topic_id),
                    Some(TopicVisibility::Deleted) | Some(TopicVisibility::Hidden)
                )
            })
            .map(|t| {
                let snapshot = current.get(&t.topic_id);
                TopicRow {
                    topic_id: t.topic_id,
                    start_time: t.start_time,
                    last_checked: snapshot.map(|s| s.timestamp),
                    folder_count: folder_counts.get(&t.folder_id).copied(),
                    checks_made: snapshot.map(|s| s.num_of_checks),
                }
            })
            .collect();

        Ok(rows)
    }

    async fn active_topics(&self, limit: usize) -> Result<Vec<TopicId>> {
        let topics = self.load_topics().await?;
        let records = self.load_visibility().await?;
        let visibility: HashMap<TopicId, &VisibilityRecord> =
            records.iter().map(|r| (r.topic_id, r)).collect();

        // Never-checked topics go first, all of them.
        let mut result: Vec<TopicId> = topics
            .iter()
            .filter(|t| !visibility.contains_key(&t.topic_id))
            .map(|t| t.topic_id)
            .collect();
        result.sort_unstable();

        // Then the stalest known rows, skipping deleted, until the cap.
        let mut known: Vec<&VisibilityRecord> = topics
            .iter()
            .filter_map(|t| visibility.get(&t.topic_id).copied())
            .filter(|r| r.status != TopicVisibility::Deleted)
            .collect();
        known.sort_by_key(|r| r.timestamp);

        for record in known {
            if result.len() >= limit {
                break;
            }
            result.push(record.topic_id);
        }

        Ok(result)
    }

    async fn current_snapshot(&self, topic_id: TopicId) -> Result<Option<FirstPostSnapshot>> {
        let snapshots = self.load_snapshots().await?;
        Ok(snapshots
            .into_iter()
            .find(|s| s.topic_id == topic_id && s.actual))
    }

    async fn insert_snapshot(&self, snapshot: FirstPostSnapshot) -> Result<()> {
        let mut snapshots = self.load_snapshots().await?;
        for existing in snapshots.iter_mut() {
            if existing.topic_id == snapshot.topic_id {
                existing.actual = false;
            }
        }
        snapshots.push(snapshot);
        self.write_json(SNAPSHOTS_KEY, &snapshots).await
    }

    async fn bump_check_count(&self, topic_id: TopicId) -> Result<()> {
        let mut snapshots = self.load_snapshots().await?;
        let current = snapshots
            .iter_mut()
            .find(|s| s.topic_id == topic_id && s.actual)
            .ok_or_else(|| {
                AppError::storage(format!("no current snapshot for topic {}", topic_id))
            })?;
        current.num_of_checks += 1;
        self.write_json(SNAPSHOTS_KEY, &snapshots).await
    }

    async fn replace_visibility(
        &self,
        topic_id: TopicId,
        status: TopicVisibility,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        if !status.is_persistable() {
            return Err(AppError::validation(format!(
                "visibility '{}' must not be persisted",
                status
            )));
        }

        let mut records = self.load_visibility().await?;
        records.retain(|r| r.topic_id != topic_id);
        records.push(VisibilityRecord {
            topic_id,
            timestamp,
            status,
        });
        self.write_json(VISIBILITY_KEY, &records).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;

    fn topic(id: TopicId, folder: u32) -> TrackedTopic {
        TrackedTopic {
            topic_id: id,
            start_time: Utc.with_ymd_and_hms(2024, 1, id as u32 % 28 + 1, 12, 0, 0).unwrap(),
            folder_id: folder,
        }
    }

    fn snapshot(id: TopicId, hash: &str, checks: u32) -> FirstPostSnapshot {
        FirstPostSnapshot {
            topic_id: id,
            timestamp: Utc::now(),
            actual: true,
            content_hash: hash.to_string(),
            content: "content".to_string(),
            num_of_checks: checks,
        }
    }

    #[tokio::test]
    async fn selection_rows_join_topics_and_snapshots() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.upsert_topic(topic(1, 10)).await.unwrap();
        store.upsert_topic(topic(2, 10)).await.unwrap();
        store.upsert_topic(topic(3, 20)).await.unwrap();
        store.insert_snapshot(snapshot(1, "aaa", 4)).await.unwrap();

        let rows = store.selection_rows().await.unwrap();
        assert_eq!(rows.len(), 3);

        let row1 = rows.iter().find(|r| r.topic_id == 1).unwrap();
        assert_eq!(row1.checks_made, Some(4));
        assert_eq!(row1.folder_count, Some(2));
        assert!(row1.last_checked.is_some());

        let row3 = rows.iter().find(|r| r.topic_id == 3).unwrap();
        assert_eq!(row3.checks_made, None);
        assert_eq!(row3.folder_count, Some(1));
    }

    #[tokio::test]
    async fn deleted_and_hidden_topics_are_excluded_from_selection() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        for id in 1..=3 {
            store.upsert_topic(topic(id, 1)).await.unwrap();
        }
        store
            .replace_visibility(1, TopicVisibility::Deleted, Utc::now())
            .await
            .unwrap();
        store
            .replace_visibility(2, TopicVisibility::Hidden, Utc::now())
            .await
            .unwrap();

        let rows = store.selection_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].topic_id, 3);
    }

    #[tokio::test]
    async fn insert_snapshot_retires_previous_current() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.insert_snapshot(snapshot(1, "old", 5)).await.unwrap();
        store.insert_snapshot(snapshot(1, "new", 1)).await.unwrap();

        let current = store.current_snapshot(1).await.unwrap().unwrap();
        assert_eq!(current.content_hash, "new");

        // History is append-only: the retired row is still on disk.
        let all = store.load_snapshots().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|s| s.actual).count(), 1);
    }

    #[tokio::test]
    async fn bump_increments_current_counter_only() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.insert_snapshot(snapshot(7, "aaa", 1)).await.unwrap();
        store.bump_check_count(7).await.unwrap();
        store.bump_check_count(7).await.unwrap();

        let current = store.current_snapshot(7).await.unwrap().unwrap();
        assert_eq!(current.num_of_checks, 3);

        assert!(store.bump_check_count(99).await.is_err());
    }

    #[tokio::test]
    async fn replace_visibility_keeps_one_row_per_topic() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store
            .replace_visibility(5, TopicVisibility::Regular, Utc::now())
            .await
            .unwrap();
        store
            .replace_visibility(5, TopicVisibility::Hidden, Utc::now())
            .await
            .unwrap();

        let records = store.load_visibility().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, TopicVisibility::Hidden);
    }

    #[tokio::test]
    async fn unreachable_visibility_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let result = store
            .replace_visibility(5, TopicVisibility::Unreachable, Utc::now())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn active_topics_orders_new_first_then_stalest() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        for id in 1..=4 {
            store.upsert_topic(topic(id, 1)).await.unwrap();
        }
        let old = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        store
            .replace_visibility(1, TopicVisibility::Regular, newer)
            .await
            .unwrap();
        store
            .replace_visibility(2, TopicVisibility::Regular, old)
            .await
            .unwrap();
        store
            .replace_visibility(3, TopicVisibility::Deleted, old)
            .await
            .unwrap();

        // 4 is never-checked, then 2 (stalest), then 1; 3 is deleted.
        let due = store.active_topics(10).await.unwrap();
        assert_eq!(due, vec![4, 2, 1]);

        let capped = store.active_topics(2).await.unwrap();
        assert_eq!(capped, vec![4, 2]);
    }
}
