//! DuckDuckGo instant-answer API client.
//!
//! ### Protocol
//!
//! - **Endpoint**: `https://api.duckduckgo.com/?q=..&format=json&no_redirect=1&no_html=1&skip_disambig=1`
//! - **Timeout**: one deadline per call (12s by default); when it fires the
//!   in-flight request is dropped, which cancels it and releases its connection.
//! - **Failures**: transport errors, non-success statuses and undecodable bodies
//!   all surface as [`FetchError`]; callers decide how to fall back.
//! - **Normalization**: [`normalize`] turns any payload into ordered, URL-unique results.

pub mod error;
pub mod request;
pub mod response;

pub use error::FetchError;
pub use request::InstantAnswerRequest;
pub use response::{InstantAnswer, RelatedTopic, normalize};

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use justsearch_core::AppConfig;
use reqwest::header;
use serde_json::Value;

/// Default base URL for the instant-answer API.
const DEFAULT_BASE_URL: &str = "https://api.duckduckgo.com/";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "justsearch/0.1";

/// Source of raw instant-answer payloads.
#[async_trait]
pub trait AnswerSource: Send + Sync {
    /// Look up `query` once and return the JSON payload.
    async fn fetch(&self, query: &str) -> Result<Value, FetchError>;
}

/// Instant-answer client configuration.
#[derive(Debug, Clone)]
pub struct InstantAnswerConfig {
    /// Base URL (default: https://api.duckduckgo.com/).
    pub base_url: String,
    /// Deadline for one lookup (default: 12s).
    pub timeout: Duration,
    /// User-agent string (default: justsearch/0.x).
    pub user_agent: String,
}

impl Default for InstantAnswerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for InstantAnswerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Instant-answer API client.
#[derive(Debug, Clone)]
pub struct InstantAnswerClient {
    http: reqwest::Client,
    base_url: url::Url,
    config: InstantAnswerConfig,
}

impl InstantAnswerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: InstantAnswerConfig) -> Result<Self, justsearch_core::Error> {
        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| justsearch_core::Error::InvalidInput(format!("invalid api base url: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| justsearch_core::Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url, config })
    }

    async fn request(&self, query: &str) -> Result<Value, FetchError> {
        let url = InstantAnswerRequest::new(query).to_url(&self.base_url);

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("instant answer response status: {}", status);

        if !status.is_success() {
            return Err(FetchError::HttpStatus { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl AnswerSource for InstantAnswerClient {
    async fn fetch(&self, query: &str) -> Result<Value, FetchError> {
        let start = Instant::now();
        tracing::debug!("querying instant answer API: query={}", query);

        let outcome = with_deadline(self.config.timeout, self.request(query)).await;

        match &outcome {
            Ok(_) => tracing::debug!("instant answer lookup completed in {:?}", start.elapsed()),
            Err(e) if e.is_timeout() => {
                tracing::warn!("instant answer lookup timed out after {:?}, request cancelled", self.config.timeout)
            }
            Err(e) => tracing::warn!("instant answer lookup failed after {:?}: {}", start.elapsed(), e),
        }

        outcome
    }
}

/// Run `request` with a deadline; on expiry the request future is dropped.
pub(crate) async fn with_deadline<F>(deadline: Duration, request: F) -> Result<Value, FetchError>
where
    F: Future<Output = Result<Value, FetchError>>,
{
    tokio::time::timeout(deadline, request)
        .await
        .unwrap_or(Err(FetchError::Timeout))
}
