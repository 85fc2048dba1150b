//! Offline asset worker.
//!
//! An independently installed request interceptor for the application shell,
//! driven through three lifecycle transitions by its host:
//!
//! - **install**: fetch every manifest asset and store them in the bucket named
//!   after the current version. All-or-nothing: one failed asset leaves the
//!   worker redundant and the previous version in control.
//! - **activate**: delete every bucket not named after the current version,
//!   then take control of open pages immediately.
//! - **fetch**: same-origin GETs only. Navigations are network-first with a
//!   cached-page then cached-root fallback; everything else is cache-first.

pub mod network;
pub mod request;

pub use network::{AssetFetcher, HttpAssetFetcher};
pub use request::{AssetRequest, AssetResponse, FetchDecision, RequestMode, cache_key};

use std::sync::Arc;

use justsearch_core::{AppConfig, CacheStorage, CachedResponse};
use reqwest::Method;
use url::Url;

/// Errors from the asset worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// A live request failed at the transport level.
    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// A manifest asset could not be fetched during install.
    #[error("failed to cache {url}: {reason}")]
    AssetFetchFailed { url: String, reason: String },

    /// A manifest path or origin is not a valid URL.
    #[error("invalid asset url {0}")]
    InvalidUrl(String),

    /// A lifecycle transition was requested from the wrong state.
    #[error("cannot {action} while {state:?}")]
    InvalidState { action: &'static str, state: WorkerState },

    /// A navigation failed and neither the page nor the fallback document is cached.
    #[error("offline and no cached copy of {0}")]
    NotCached(String),

    #[error(transparent)]
    Storage(#[from] justsearch_core::Error),
}

impl From<WorkerError> for justsearch_core::Error {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::AssetFetchFailed { url, reason } => justsearch_core::Error::AssetFetchFailed { url, reason },
            WorkerError::Storage(e) => e,
            WorkerError::NotCached(url) => justsearch_core::Error::CacheMiss(url),
            other => justsearch_core::Error::Network(other.to_string()),
        }
    }
}

/// Lifecycle position of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Activating,
    Active,
    /// Install failed; this version never takes control.
    Redundant,
}

/// Versioned cache and routing settings for the worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub version: String,
    pub manifest: Vec<String>,
    pub fallback_document: String,
}

impl TryFrom<&AppConfig> for WorkerConfig {
    type Error = WorkerError;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        let origin = Url::parse(&config.app_origin).map_err(|e| WorkerError::InvalidUrl(format!("{}: {e}", config.app_origin)))?;
        Ok(Self {
            origin,
            version: config.asset_cache_version.clone(),
            manifest: config.asset_manifest.clone(),
            fallback_document: config.fallback_document.clone(),
        })
    }
}

/// One version of the asset worker.
pub struct AssetCacheWorker {
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn AssetFetcher>,
    state: WorkerState,
}

impl AssetCacheWorker {
    pub fn new(config: WorkerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn AssetFetcher>) -> Self {
        Self { config, storage, network, state: WorkerState::Installing }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Name of this version's bucket.
    pub fn cache_name(&self) -> &str {
        &self.config.version
    }

    /// Absolute URLs of the manifest assets.
    pub fn manifest_urls(&self) -> Result<Vec<Url>, WorkerError> {
        self.config.manifest.iter().map(|path| self.resolve(path)).collect()
    }

    fn resolve(&self, path: &str) -> Result<Url, WorkerError> {
        self.config
            .origin
            .join(path)
            .map_err(|e| WorkerError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Populate this version's bucket with the whole manifest.
    ///
    /// Returns the number of cached assets. On any failure the worker becomes
    /// [`WorkerState::Redundant`].
    pub async fn install(&mut self) -> Result<usize, WorkerError> {
        if self.state != WorkerState::Installing {
            return Err(WorkerError::InvalidState { action: "install", state: self.state });
        }

        match self.populate().await {
            Ok(count) => {
                tracing::info!(version = %self.config.version, assets = count, "asset worker installed");
                self.state = WorkerState::Activating;
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(version = %self.config.version, "asset worker install failed: {}", e);
                self.state = WorkerState::Redundant;
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<usize, WorkerError> {
        let mut fetched = Vec::with_capacity(self.config.manifest.len());
        for url in self.manifest_urls()? {
            let response = self
                .network
                .fetch(&url)
                .await
                .map_err(|e| WorkerError::AssetFetchFailed { url: url.to_string(), reason: e.to_string() })?;
            if !response.is_success() {
                return Err(WorkerError::AssetFetchFailed {
                    url: url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            fetched.push((cache_key(&url), CachedResponse::from(&response)));
        }

        let bucket = self.cache_name();
        let existed = self.storage.bucket_names().await?.iter().any(|name| name == bucket);
        self.storage.open_bucket(bucket).await?;

        for (key, response) in &fetched {
            if let Err(e) = self.storage.put(bucket, key, response).await {
                if !existed && let Err(cleanup) = self.storage.delete_bucket(bucket).await {
                    tracing::warn!("failed to remove partial bucket {}: {}", bucket, cleanup);
                }
                return Err(e.into());
            }
        }

        Ok(fetched.len())
    }

    /// Delete every bucket from other versions and take control.
    ///
    /// Returns the names of the deleted buckets.
    pub async fn activate(&mut self) -> Result<Vec<String>, WorkerError> {
        if self.state != WorkerState::Activating {
            return Err(WorkerError::InvalidState { action: "activate", state: self.state });
        }

        let mut deleted = Vec::new();
        for name in self.storage.bucket_names().await? {
            if name != self.config.version && self.storage.delete_bucket(&name).await? {
                tracing::debug!("deleted stale asset bucket {}", name);
                deleted.push(name);
            }
        }

        self.state = WorkerState::Active;
        tracing::info!(version = %self.config.version, purged = deleted.len(), "asset worker active, claiming open pages");
        Ok(deleted)
    }

    /// Whether the worker answers `request` instead of letting it through.
    pub fn intercepts(&self, request: &AssetRequest) -> bool {
        self.state == WorkerState::Active
            && request.method == Method::GET
            && request.url.origin() == self.config.origin.origin()
    }

    /// Route an intercepted request through the matching cache policy.
    pub async fn handle_fetch(&self, request: &AssetRequest) -> Result<FetchDecision, WorkerError> {
        if !self.intercepts(request) {
            return Ok(FetchDecision::Passthrough);
        }

        let response = match request.mode {
            RequestMode::Navigate => self.network_first(&request.url).await?,
            RequestMode::Subresource => self.cache_first(&request.url).await?,
        };
        Ok(FetchDecision::Respond(response))
    }

    async fn network_first(&self, url: &Url) -> Result<AssetResponse, WorkerError> {
        let key = cache_key(url);
        match self.network.fetch(url).await {
            Ok(response) => {
                self.store(&key, &response).await;
                Ok(response)
            }
            Err(e) => {
                tracing::debug!("navigation to {} failed, trying cache: {}", url, e);
                if let Some(cached) = self.storage.get(self.cache_name(), &key).await? {
                    return Ok(cached.into());
                }
                let fallback = cache_key(&self.resolve(&self.config.fallback_document)?);
                self.storage
                    .get(self.cache_name(), &fallback)
                    .await?
                    .map(AssetResponse::from)
                    .ok_or(WorkerError::NotCached(key))
            }
        }
    }

    async fn cache_first(&self, url: &Url) -> Result<AssetResponse, WorkerError> {
        let key = cache_key(url);
        if let Some(cached) = self.storage.get(self.cache_name(), &key).await? {
            return Ok(cached.into());
        }

        let response = self.network.fetch(url).await?;
        self.store(&key, &response).await;
        Ok(response)
    }

    /// Best-effort write; a failed write never fails the request.
    async fn store(&self, key: &str, response: &AssetResponse) {
        if let Err(e) = self.storage.put(self.cache_name(), key, &CachedResponse::from(response)).await {
            tracing::warn!("failed to cache {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use justsearch_core::{CacheDb, MemoryCacheStorage};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const ORIGIN: &str = "http://localhost:8080/";

    /// Network double serving a fixed set of URLs.
    #[derive(Default)]
    struct StubNetwork {
        pages: Mutex<HashMap<String, AssetResponse>>,
        offline: AtomicBool,
        calls: AtomicUsize,
    }

    impl StubNetwork {
        fn serving(paths: &[&str]) -> Arc<Self> {
            let network = Self::default();
            for path in paths {
                network.serve(path, 200, &format!("body of {path}"));
            }
            Arc::new(network)
        }

        fn serve(&self, path: &str, status: u16, body: &str) {
            let url = Url::parse(ORIGIN).unwrap().join(path).unwrap();
            self.pages.lock().unwrap().insert(
                url.to_string(),
                AssetResponse { status, content_type: Some("text/plain".into()), body: Bytes::from(body.to_string()) },
            );
        }

        fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssetFetcher for StubNetwork {
        async fn fetch(&self, url: &Url) -> Result<AssetResponse, WorkerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(WorkerError::Network { url: url.to_string(), reason: "offline".into() });
            }
            Ok(self.pages.lock().unwrap().get(url.as_str()).cloned().unwrap_or(AssetResponse {
                status: 404,
                content_type: None,
                body: Bytes::new(),
            }))
        }
    }

    fn config(version: &str) -> WorkerConfig {
        WorkerConfig {
            origin: Url::parse(ORIGIN).unwrap(),
            version: version.to_string(),
            manifest: vec!["./".into(), "./index.html".into(), "./app.js".into()],
            fallback_document: "./index.html".into(),
        }
    }

    fn url(path: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(path).unwrap()
    }

    async fn active_worker(
        storage: Arc<dyn CacheStorage>, network: Arc<StubNetwork>,
    ) -> AssetCacheWorker {
        let mut worker = AssetCacheWorker::new(config("justsearch-v2"), storage, network);
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        worker
    }

    fn body(decision: FetchDecision) -> String {
        match decision {
            FetchDecision::Respond(response) => String::from_utf8(response.body.to_vec()).unwrap(),
            FetchDecision::Passthrough => panic!("request was not intercepted"),
        }
    }

    #[test]
    fn test_worker_config_from_app_config() {
        let config = WorkerConfig::try_from(&AppConfig::default()).unwrap();
        assert_eq!(config.version, "justsearch-v1");
        assert_eq!(config.origin.as_str(), "http://localhost:8080/");
        assert_eq!(config.manifest.len(), 8);
    }

    #[tokio::test]
    async fn test_install_caches_whole_manifest() {
        let storage = MemoryCacheStorage::new();
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let mut worker = AssetCacheWorker::new(config("justsearch-v1"), Arc::new(storage.clone()), network);

        assert_eq!(worker.install().await.unwrap(), 3);
        assert_eq!(worker.state(), WorkerState::Activating);

        for path in ["./", "./index.html", "./app.js"] {
            let key = cache_key(&url(path));
            assert!(storage.get("justsearch-v1", &key).await.unwrap().is_some(), "{path} not cached");
        }
    }

    #[tokio::test]
    async fn test_install_fails_when_any_asset_missing() {
        let storage = MemoryCacheStorage::new();
        let network = StubNetwork::serving(&["./", "./index.html"]);
        let mut worker = AssetCacheWorker::new(config("justsearch-v1"), Arc::new(storage.clone()), network);

        let result = worker.install().await;

        assert!(matches!(result, Err(WorkerError::AssetFetchFailed { ref url, .. }) if url.ends_with("/app.js")));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(storage.bucket_names().await.unwrap().is_empty());
        assert!(matches!(worker.activate().await, Err(WorkerError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_install_fails_when_offline() {
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        network.go_offline();
        let mut worker = AssetCacheWorker::new(config("justsearch-v1"), Arc::new(MemoryCacheStorage::new()), network);

        assert!(matches!(worker.install().await, Err(WorkerError::AssetFetchFailed { .. })));
        assert_eq!(worker.state(), WorkerState::Redundant);
    }

    #[tokio::test]
    async fn test_activate_keeps_only_current_bucket() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("v1").await.unwrap();
        db.put("v1", "http://localhost:8080/app.js", &CachedResponse { status: 200, content_type: None, body: b"old".to_vec() })
            .await
            .unwrap();

        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let mut worker = AssetCacheWorker::new(config("v2-current"), Arc::new(db.clone()), network);
        worker.install().await.unwrap();

        let deleted = worker.activate().await.unwrap();

        assert_eq!(deleted, vec!["v1".to_string()]);
        assert_eq!(db.bucket_names().await.unwrap(), vec!["v2-current".to_string()]);
        assert_eq!(worker.state(), WorkerState::Active);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let network = StubNetwork::serving(&[]);
        let mut worker = AssetCacheWorker::new(config("v1"), Arc::new(MemoryCacheStorage::new()), network);
        assert!(matches!(
            worker.activate().await,
            Err(WorkerError::InvalidState { action: "activate", state: WorkerState::Installing })
        ));
    }

    #[tokio::test]
    async fn test_passthrough_rules() {
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let worker = active_worker(Arc::new(MemoryCacheStorage::new()), network).await;

        let post = AssetRequest::get(url("./app.js")).with_method(Method::POST);
        assert_eq!(worker.handle_fetch(&post).await.unwrap(), FetchDecision::Passthrough);

        let cross_origin = AssetRequest::get(Url::parse("https://api.duckduckgo.com/?q=cats").unwrap());
        assert_eq!(worker.handle_fetch(&cross_origin).await.unwrap(), FetchDecision::Passthrough);

        let other_port = AssetRequest::navigate(Url::parse("http://localhost:9090/").unwrap());
        assert_eq!(worker.handle_fetch(&other_port).await.unwrap(), FetchDecision::Passthrough);
    }

    #[tokio::test]
    async fn test_not_active_passes_through() {
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let mut worker = AssetCacheWorker::new(config("v1"), Arc::new(MemoryCacheStorage::new()), network);
        worker.install().await.unwrap();

        let request = AssetRequest::get(url("./app.js"));
        assert_eq!(worker.handle_fetch(&request).await.unwrap(), FetchDecision::Passthrough);
    }

    #[tokio::test]
    async fn test_cache_first_serves_cached_copy() {
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let worker = active_worker(Arc::new(MemoryCacheStorage::new()), network.clone()).await;
        let installed_calls = network.calls();

        network.serve("./app.js", 200, "changed on server");
        let decision = worker.handle_fetch(&AssetRequest::get(url("./app.js"))).await.unwrap();

        assert_eq!(body(decision), "body of ./app.js");
        assert_eq!(network.calls(), installed_calls);
    }

    #[tokio::test]
    async fn test_cache_first_fetches_and_stores_miss() {
        let storage = MemoryCacheStorage::new();
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let worker = active_worker(Arc::new(storage.clone()), network.clone()).await;

        network.serve("./assets/icons/icon-192.png", 200, "png");
        let request = AssetRequest::get(url("./assets/icons/icon-192.png"));
        assert_eq!(body(worker.handle_fetch(&request).await.unwrap()), "png");

        network.go_offline();
        assert_eq!(body(worker.handle_fetch(&request).await.unwrap()), "png");
    }

    #[tokio::test]
    async fn test_cache_first_miss_while_offline_fails() {
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let worker = active_worker(Arc::new(MemoryCacheStorage::new()), network.clone()).await;
        network.go_offline();

        let result = worker.handle_fetch(&AssetRequest::get(url("./styles.css"))).await;
        assert!(matches!(result, Err(WorkerError::Network { .. })));
    }

    #[tokio::test]
    async fn test_network_first_prefers_live_page() {
        let storage = MemoryCacheStorage::new();
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let worker = active_worker(Arc::new(storage.clone()), network.clone()).await;

        network.serve("./", 200, "fresh shell");
        let decision = worker.handle_fetch(&AssetRequest::navigate(url("./"))).await.unwrap();
        assert_eq!(body(decision), "fresh shell");

        let cached = storage.get("justsearch-v2", &cache_key(&url("./"))).await.unwrap().unwrap();
        assert_eq!(cached.body, b"fresh shell");
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cached_page() {
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let worker = active_worker(Arc::new(MemoryCacheStorage::new()), network.clone()).await;
        network.go_offline();

        let decision = worker.handle_fetch(&AssetRequest::navigate(url("./"))).await.unwrap();
        assert_eq!(body(decision), "body of ./");
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_root_document() {
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let worker = active_worker(Arc::new(MemoryCacheStorage::new()), network.clone()).await;
        network.go_offline();

        let decision = worker.handle_fetch(&AssetRequest::navigate(url("./?q=cats#top"))).await.unwrap();
        assert_eq!(body(decision), "body of ./index.html");
    }

    #[tokio::test]
    async fn test_network_first_without_any_cache_fails() {
        let storage = MemoryCacheStorage::new();
        let network = StubNetwork::serving(&["./", "./index.html", "./app.js"]);
        let worker = active_worker(Arc::new(storage.clone()), network.clone()).await;
        storage.delete_bucket("justsearch-v2").await.unwrap();
        network.go_offline();

        let result = worker.handle_fetch(&AssetRequest::navigate(url("./about"))).await;
        assert!(matches!(result, Err(WorkerError::NotCached(_))));
    }
}
