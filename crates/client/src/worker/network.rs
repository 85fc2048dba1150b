//! Live network access for the asset worker.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use url::Url;

use super::WorkerError;
use super::request::AssetResponse;

/// Performs live requests on behalf of the worker.
///
/// Only transport failures are errors; any HTTP status is a response.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<AssetResponse, WorkerError>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    http: reqwest::Client,
}

impl HttpAssetFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, WorkerError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| WorkerError::Network { url: String::new(), reason: format!("failed to build HTTP client: {e}") })?;

        Ok(Self { http })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &Url) -> Result<AssetResponse, WorkerError> {
        let network_error = |e: reqwest::Error| WorkerError::Network { url: url.to_string(), reason: e.to_string() };

        let response = self.http.get(url.clone()).send().await.map_err(network_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await.map_err(network_error)?;

        tracing::debug!("fetched asset {} ({}, {} bytes)", url, status, body.len());

        Ok(AssetResponse { status, content_type, body })
    }
}
