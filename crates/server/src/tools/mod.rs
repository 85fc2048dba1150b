//! MCP tool implementations.
//!
//! Every tool renders into its own [`RecordingSink`](justsearch_client::RecordingSink)
//! and returns what a page would have shown as pretty JSON.

pub mod assets;
pub mod connectivity;
pub mod search;

pub use assets::{AssetFetchParams, WorkerSlot, asset_fetch_impl, worker_install_impl};
pub use connectivity::{SetConnectivityParams, set_connectivity_impl};
pub use search::{RestoreParams, SearchParams, restore_impl, search_impl};

use justsearch_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Serialize a tool's output as the single text content of a successful result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
