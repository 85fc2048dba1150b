//! MCP server handler implementation.
//!
//! This module defines the main server handler that acts as the presentation
//! host: it owns the orchestrator and the asset worker and routes tool calls
//! to the appropriate implementations.

use std::sync::Arc;

use crate::tools::{
    AssetFetchParams, RestoreParams, SearchParams, SetConnectivityParams, WorkerSlot, asset_fetch_impl, restore_impl,
    search_impl, set_connectivity_impl, worker_install_impl,
};
use justsearch_client::{
    AssetFetcher, Connectivity, HttpAssetFetcher, InstantAnswerClient, InstantAnswerConfig, SearchOrchestrator,
    WorkerConfig,
};
use justsearch_core::{AppConfig, CacheDb, CacheStorage, Error, SnapshotStore};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for justsearch.
#[derive(Clone)]
pub struct JustSearchServer {
    tool_router: ToolRouter<Self>,
    config: Arc<AppConfig>,
    orchestrator: Arc<SearchOrchestrator>,
    storage: Arc<dyn CacheStorage>,
    assets: Arc<dyn AssetFetcher>,
    worker: WorkerSlot,
}

#[tool_router]
impl JustSearchServer {
    /// Wire the orchestrator and asset worker to the given database.
    pub fn new(config: AppConfig, db: CacheDb) -> Result<Self, Error> {
        let client = InstantAnswerClient::new(InstantAnswerConfig::from(&config))?;
        let snapshots = SnapshotStore::new(Arc::new(db.clone()), config.snapshot_key.clone());
        let connectivity = Connectivity::new(!config.offline);
        let orchestrator =
            SearchOrchestrator::new(Arc::new(client), snapshots, connectivity, &config.external_search_url)?;
        let assets = HttpAssetFetcher::new(&config.user_agent, config.timeout())?;

        Ok(Self {
            tool_router: Self::tool_router(),
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            storage: Arc::new(db),
            assets: Arc::new(assets),
            worker: WorkerSlot::default(),
        })
    }

    /// Run a search and report what the page shows.
    #[tool(
        description = "Search instant answers. Falls back to the last saved results when offline or when the lookup fails. With lucky=true, navigates to the first safe result."
    )]
    async fn search(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.orchestrator, params.0).await
    }

    /// Initial page load.
    #[tool(
        description = "Initial page load. Searches for the given query or the configured startup query; otherwise shows the last saved results without a network request."
    )]
    async fn restore(&self, params: Parameters<RestoreParams>) -> Result<CallToolResult, McpError> {
        restore_impl(&self.orchestrator, self.config.startup_query(), params.0).await
    }

    #[tool(description = "Report a connectivity change. Going offline shows the offline banner and serves searches from saved results.")]
    async fn set_connectivity(&self, params: Parameters<SetConnectivityParams>) -> Result<CallToolResult, McpError> {
        set_connectivity_impl(&self.orchestrator, params.0)
    }

    /// Install and activate the configured asset worker version.
    #[tool(
        description = "Install the offline asset worker: cache every manifest asset under the configured version, then delete buckets from older versions."
    )]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        let config = WorkerConfig::try_from(self.config.as_ref()).map_err(Error::from)?;
        worker_install_impl(&self.worker, config, self.storage.clone(), self.assets.clone()).await
    }

    #[tool(description = "Send a request through the offline asset worker. Reports whether it was answered from the worker or passed through.")]
    async fn asset_fetch(&self, params: Parameters<AssetFetchParams>) -> Result<CallToolResult, McpError> {
        asset_fetch_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for JustSearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "justsearch".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
