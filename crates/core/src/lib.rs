//! Core types and shared functionality for justsearch.
//!
//! This crate provides:
//! - Result and snapshot data model
//! - SQLite-backed storage for the last-search snapshot and asset cache buckets
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod model;

pub use cache::{
    CacheDb, CacheStorage, CachedResponse, KeyValueStore, MemoryCacheStorage, MemoryStore, Snapshot, SnapshotStore,
};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use model::SearchResult;
