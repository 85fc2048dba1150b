//! Last-search snapshot persistence.
//!
//! Exactly one snapshot exists at a time: every save overwrites the previous
//! one. Reads never fail; a missing, unreadable or undecodable value is
//! reported as "no snapshot".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kv::KeyValueStore;
use crate::{Error, SearchResult};

/// The results of the most recent successful remote search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub query: String,
    pub results: Vec<SearchResult>,
    #[serde(rename = "savedAt", with = "chrono::serde::ts_milliseconds")]
    pub saved_at: DateTime<Utc>,
}

impl Snapshot {
    /// Whether this snapshot was taken for `query`, ignoring case.
    pub fn matches_query(&self, query: &str) -> bool {
        self.query.to_lowercase() == query.to_lowercase()
    }
}

/// Handle on the single persisted snapshot.
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore").field("key", &self.key).finish_non_exhaustive()
    }
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    /// Persist `results` for `query`, stamped with the current time.
    pub async fn save(&self, query: &str, results: &[SearchResult]) -> Result<Snapshot, Error> {
        let snapshot = Snapshot { query: query.to_string(), results: results.to_vec(), saved_at: Utc::now() };
        let json = serde_json::to_string(&snapshot).map_err(|e| Error::InvalidInput(e.to_string()))?;
        self.store.set(&self.key, &json).await?;
        tracing::debug!(query, results = results.len(), "saved snapshot");
        Ok(snapshot)
    }

    /// Read the persisted snapshot, if there is a usable one.
    pub async fn load(&self) -> Option<Snapshot> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to read snapshot: {}", e);
                return None;
            }
        };

        match decode(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(key = %self.key, "ignoring snapshot: {}", e);
                None
            }
        }
    }
}

fn decode(raw: &str) -> Result<Snapshot, Error> {
    serde_json::from_str(raw).map_err(|e| Error::StorageCorrupt(e.to_string()))
}
