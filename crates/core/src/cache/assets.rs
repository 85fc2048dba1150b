//! Versioned asset cache buckets.
//!
//! A bucket is a named map from request URL to a stored response. The asset
//! worker keeps one bucket per deployed version and deletes the others when
//! a new version activates.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

use super::connection::CacheDb;
use crate::Error;

/// A response stored in an asset bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Storage for named asset buckets.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of all existing buckets.
    async fn bucket_names(&self) -> Result<Vec<String>, Error>;

    /// Create the bucket if it does not exist yet.
    async fn open_bucket(&self, name: &str) -> Result<(), Error>;

    /// Delete a bucket and all of its entries. Returns whether it existed.
    async fn delete_bucket(&self, name: &str) -> Result<bool, Error>;

    /// Look up the response stored for `url` in `bucket`.
    async fn get(&self, bucket: &str, url: &str) -> Result<Option<CachedResponse>, Error>;

    /// Store a response for `url` in `bucket`, creating the bucket if needed.
    async fn put(&self, bucket: &str, url: &str, response: &CachedResponse) -> Result<(), Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM asset_buckets ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn open_bucket(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO asset_buckets (name, created_at) VALUES (?1, ?2)",
                    params![name, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM asset_buckets WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let bucket = bucket.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let entry = conn
                    .query_row(
                        "SELECT status, content_type, body FROM asset_entries WHERE bucket = ?1 AND url = ?2",
                        params![bucket, url],
                        |row| {
                            Ok(CachedResponse {
                                status: row.get(0)?,
                                content_type: row.get(1)?,
                                body: row.get(2)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(entry)
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, bucket: &str, url: &str, response: &CachedResponse) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let url = url.to_string();
        let response = response.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO asset_buckets (name, created_at) VALUES (?1, ?2)",
                    params![bucket, stored_at],
                )?;
                tx.execute(
                    "INSERT INTO asset_entries (bucket, url, status, content_type, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(bucket, url) DO UPDATE SET
                        status = excluded.status,
                        content_type = excluded.content_type,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![bucket, url, response.status, response.content_type, response.body, stored_at],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

/// In-memory bucket storage. Clones share the same buckets.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStorage {
    buckets: Arc<RwLock<BTreeMap<String, HashMap<String, CachedResponse>>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn open_bucket(&self, name: &str) -> Result<(), Error> {
        self.buckets.write().await.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        Ok(self.buckets.write().await.remove(name).is_some())
    }

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        Ok(self
            .buckets
            .read()
            .await
            .get(bucket)
            .and_then(|entries| entries.get(url))
            .cloned())
    }

    async fn put(&self, bucket: &str, url: &str, response: &CachedResponse) -> Result<(), Error> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(url.to_string(), response.clone());
        Ok(())
    }
}
