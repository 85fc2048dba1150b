//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent`, `snapshot_key` or `asset_cache_version` is empty
    /// - a configured URL is not an absolute http(s) URL
    /// - `asset_manifest` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        for (field, value) in [
            ("user_agent", &self.user_agent),
            ("snapshot_key", &self.snapshot_key),
            ("asset_cache_version", &self.asset_cache_version),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
        }

        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("external_search_url", &self.external_search_url),
            ("app_origin", &self.app_origin),
        ] {
            validate_http_url(field, value)?;
        }

        if self.asset_manifest.is_empty() {
            return Err(ConfigError::Invalid { field: "asset_manifest".into(), reason: "must list at least one path".into() });
        }

        if self.startup_query.is_some() && self.offline {
            tracing::warn!("startup_query is set while offline; only a cached snapshot for it can be shown");
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::Invalid { field: field.into(), reason: e.to_string() })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::Invalid { field: field.into(), reason: format!("unsupported scheme: {scheme}") }),
    }
}
