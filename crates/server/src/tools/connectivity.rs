//! set_connectivity tool implementation.

use justsearch_client::{PresentationSink, RecordingSink, SearchOrchestrator};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the set_connectivity tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetConnectivityParams {
    /// Whether the network is reachable.
    pub online: bool,
}

/// Output from the set_connectivity tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityOutput {
    pub online: bool,
    /// Whether this call flipped the previous state.
    pub changed: bool,
    pub offline_banner: bool,
}

/// Implementation of the set_connectivity tool.
pub fn set_connectivity_impl(
    orchestrator: &SearchOrchestrator, params: SetConnectivityParams,
) -> Result<CallToolResult, McpError> {
    let was_online = orchestrator.connectivity().is_online();
    let mut page = RecordingSink::new();
    page.set_offline_banner(!was_online);

    orchestrator.connectivity_changed(params.online, &mut page);

    json_result(&ConnectivityOutput {
        online: params.online,
        changed: was_online != params.online,
        offline_banner: page.offline_banner,
    })
}
