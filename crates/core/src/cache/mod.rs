//! SQLite-backed storage for the last-search snapshot and the asset cache.
//!
//! This module provides persistent storage using SQLite with async access
//! via tokio-rusqlite, plus in-memory equivalents behind the same traits:
//!
//! - A single-key JSON blob store for the last-search snapshot
//! - Named, versioned buckets of cached asset responses
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod assets;
pub mod connection;
pub mod kv;
pub mod migrations;
pub mod snapshots;

pub use crate::Error;

pub use assets::{CacheStorage, CachedResponse, MemoryCacheStorage};
pub use connection::CacheDb;
pub use kv::{KeyValueStore, MemoryStore};
pub use snapshots::{Snapshot, SnapshotStore};
