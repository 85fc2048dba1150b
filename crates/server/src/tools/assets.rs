//! worker_install and asset_fetch tool implementations.
//!
//! Each install builds a fresh worker version from config. It replaces the
//! worker in control only once it has installed and activated.

use std::sync::Arc;

use justsearch_client::{
    AssetCacheWorker, AssetFetcher, AssetRequest, FetchDecision, WorkerConfig, WorkerError, WorkerState,
};
use justsearch_core::{CacheStorage, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use super::json_result;

/// The worker version currently in control, if any.
pub type WorkerSlot = Arc<RwLock<Option<AssetCacheWorker>>>;

/// Input parameters for the asset_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetFetchParams {
    /// Absolute URL of the requested resource.
    pub url: String,

    /// Treat the request as a top-level page load.
    #[serde(default)]
    pub navigate: bool,
}

/// Output from the worker_install tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInstallOutput {
    pub version: String,
    pub cached: usize,
    /// Buckets from older versions removed on activation.
    pub purged: Vec<String>,
}

/// Output from the asset_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetFetchOutput {
    /// False when the request went straight to the network untouched.
    pub intercepted: bool,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub size: Option<usize>,
}

fn worker_error(err: WorkerError) -> McpError {
    Error::from(err).into()
}

/// Implementation of the worker_install tool.
pub async fn worker_install_impl(
    slot: &WorkerSlot, config: WorkerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn AssetFetcher>,
) -> Result<CallToolResult, McpError> {
    let mut worker = AssetCacheWorker::new(config, storage, network);
    let cached = worker.install().await.map_err(worker_error)?;
    let purged = worker.activate().await.map_err(worker_error)?;

    let output = WorkerInstallOutput { version: worker.cache_name().to_string(), cached, purged };
    *slot.write().await = Some(worker);

    json_result(&output)
}

/// Implementation of the asset_fetch tool.
pub async fn asset_fetch_impl(slot: &WorkerSlot, params: AssetFetchParams) -> Result<CallToolResult, McpError> {
    let url = Url::parse(&params.url).map_err(|e| Error::InvalidInput(format!("invalid url {}: {e}", params.url)))?;
    let request = if params.navigate { AssetRequest::navigate(url) } else { AssetRequest::get(url) };

    let guard = slot.read().await;
    let decision = match guard.as_ref() {
        Some(worker) if worker.state() == WorkerState::Active => {
            worker.handle_fetch(&request).await.map_err(worker_error)?
        }
        _ => FetchDecision::Passthrough,
    };

    let output = match decision {
        FetchDecision::Passthrough => {
            AssetFetchOutput { intercepted: false, status: None, content_type: None, size: None }
        }
        FetchDecision::Respond(response) => AssetFetchOutput {
            intercepted: true,
            status: Some(response.status),
            size: Some(response.body.len()),
            content_type: response.content_type,
        },
    };

    json_result(&output)
}
