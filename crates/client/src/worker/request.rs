//! Requests the asset worker sees and the responses it hands back.

use bytes::Bytes;
use justsearch_core::CachedResponse;
use reqwest::Method;
use url::Url;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level page load.
    Navigate,
    /// Stylesheets, scripts, images and every other sub-resource.
    Subresource,
}

/// A request offered to the worker for interception.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
}

impl AssetRequest {
    pub fn navigate(url: Url) -> Self {
        Self { method: Method::GET, url, mode: RequestMode::Navigate }
    }

    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, mode: RequestMode::Subresource }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }
}

/// A response produced by the network or read back from a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl AssetResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<CachedResponse> for AssetResponse {
    fn from(cached: CachedResponse) -> Self {
        Self { status: cached.status, content_type: cached.content_type, body: Bytes::from(cached.body) }
    }
}

impl From<&AssetResponse> for CachedResponse {
    fn from(response: &AssetResponse) -> Self {
        Self { status: response.status, content_type: response.content_type.clone(), body: response.body.to_vec() }
    }
}

/// What the worker did with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    /// Not handled; the host performs the request as if no worker existed.
    Passthrough,
    /// Answered by the worker.
    Respond(AssetResponse),
}

/// Bucket key for a request URL. Fragments never reach the server, so they are dropped.
pub fn cache_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_drops_fragment() {
        let url = Url::parse("http://localhost:8080/index.html#results").unwrap();
        assert_eq!(cache_key(&url), "http://localhost:8080/index.html");
    }

    #[test]
    fn test_cached_response_conversion() {
        let response =
            AssetResponse { status: 200, content_type: Some("text/css".into()), body: Bytes::from_static(b"body{}") };
        let cached = CachedResponse::from(&response);
        assert_eq!(AssetResponse::from(cached), response);
    }

    #[test]
    fn test_is_success() {
        let mut response = AssetResponse { status: 204, content_type: None, body: Bytes::new() };
        assert!(response.is_success());
        response.status = 404;
        assert!(!response.is_success());
    }
}
