//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (JUSTSEARCH_*)
//! 2. TOML config file (if JUSTSEARCH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (JUSTSEARCH_*)
/// 2. TOML config file (if JUSTSEARCH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the instant-answer API.
    ///
    /// Set via JUSTSEARCH_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Full search engine page linked from the results view.
    ///
    /// Set via JUSTSEARCH_EXTERNAL_SEARCH_URL environment variable.
    #[serde(default = "default_external_search_url")]
    pub external_search_url: String,

    /// Path to SQLite database holding the snapshot and asset buckets.
    ///
    /// Set via JUSTSEARCH_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via JUSTSEARCH_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Remote search timeout in milliseconds.
    ///
    /// Set via JUSTSEARCH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Storage key of the last-search snapshot.
    ///
    /// Set via JUSTSEARCH_SNAPSHOT_KEY environment variable.
    #[serde(default = "default_snapshot_key")]
    pub snapshot_key: String,

    /// Start with the connectivity signal reporting offline.
    ///
    /// Set via JUSTSEARCH_OFFLINE environment variable.
    #[serde(default)]
    pub offline: bool,

    /// Query to run on initial load instead of restoring the snapshot.
    ///
    /// Set via JUSTSEARCH_STARTUP_QUERY environment variable.
    #[serde(default)]
    pub startup_query: Option<String>,

    /// Name of the current asset cache bucket.
    ///
    /// Set via JUSTSEARCH_ASSET_CACHE_VERSION environment variable.
    #[serde(default = "default_asset_cache_version")]
    pub asset_cache_version: String,

    /// Origin the asset worker serves.
    ///
    /// Set via JUSTSEARCH_APP_ORIGIN environment variable.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// Application shell paths cached on install, relative to `app_origin`.
    #[serde(default = "default_asset_manifest")]
    pub asset_manifest: Vec<String>,

    /// Document served when a navigation fails and the page itself is not cached.
    #[serde(default = "default_fallback_document")]
    pub fallback_document: String,
}

fn default_api_base_url() -> String {
    "https://api.duckduckgo.com/".into()
}

fn default_external_search_url() -> String {
    "https://duckduckgo.com/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./justsearch.sqlite")
}

fn default_user_agent() -> String {
    "justsearch/0.1".into()
}

fn default_timeout_ms() -> u64 {
    12_000
}

fn default_snapshot_key() -> String {
    "justsearch:last-results".into()
}

fn default_asset_cache_version() -> String {
    "justsearch-v1".into()
}

fn default_app_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_asset_manifest() -> Vec<String> {
    [
        "./",
        "./index.html",
        "./styles.css",
        "./app.js",
        "./manifest.webmanifest",
        "./assets/logos/justsearch_logo.png",
        "./assets/icons/icon-192.png",
        "./assets/icons/icon-512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_fallback_document() -> String {
    "./index.html".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            external_search_url: default_external_search_url(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            snapshot_key: default_snapshot_key(),
            offline: false,
            startup_query: None,
            asset_cache_version: default_asset_cache_version(),
            app_origin: default_app_origin(),
            asset_manifest: default_asset_manifest(),
            fallback_document: default_fallback_document(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Startup query with surrounding whitespace removed, if any is left.
    pub fn startup_query(&self) -> Option<&str> {
        self.startup_query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `JUSTSEARCH_`
    /// 2. TOML file from `JUSTSEARCH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("JUSTSEARCH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("JUSTSEARCH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
