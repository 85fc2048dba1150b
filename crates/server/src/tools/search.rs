//! search and restore tool implementations.

use justsearch_client::{PresentationSink, RecordingSink, ResultSource, SearchOrchestrator, SearchOutcome, SearchState};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// The search query. Surrounding whitespace is ignored.
    pub query: String,

    /// Navigate to the first safe result once results are available.
    #[serde(default)]
    pub lucky: bool,
}

/// Input parameters for the restore tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RestoreParams {
    /// Query from the page address, if any. Falls back to the configured startup query.
    #[serde(default)]
    pub query: Option<String>,
}

/// What the page shows after a search or restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchView {
    pub state: SearchState,
    pub source: Option<ResultSource>,
    #[serde(flatten)]
    pub page: RecordingSink,
}

impl SearchView {
    fn new(outcome: SearchOutcome, page: RecordingSink) -> Self {
        Self { state: outcome.state, source: outcome.source, page }
    }
}

fn page_for(orchestrator: &SearchOrchestrator) -> RecordingSink {
    let mut page = RecordingSink::new();
    page.set_offline_banner(!orchestrator.connectivity().is_online());
    page
}

/// Implementation of the search tool.
pub async fn search_impl(orchestrator: &SearchOrchestrator, params: SearchParams) -> Result<CallToolResult, McpError> {
    let mut page = page_for(orchestrator);
    let outcome = if params.lucky {
        orchestrator.lucky(&params.query, &mut page).await
    } else {
        orchestrator.search(&params.query, false, &mut page).await
    };

    tracing::debug!(state = ?outcome.state, results = outcome.results.len(), "search tool finished");
    json_result(&SearchView::new(outcome, page))
}

/// Implementation of the restore tool.
pub async fn restore_impl(
    orchestrator: &SearchOrchestrator, startup_query: Option<&str>, params: RestoreParams,
) -> Result<CallToolResult, McpError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .or(startup_query);

    let mut page = page_for(orchestrator);
    let outcome = orchestrator.restore(query, &mut page).await;
    json_result(&SearchView::new(outcome, page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{ScriptedSource, orchestrator, output, rust_payload};
    use justsearch_client::FetchError;
    use std::sync::Arc;

    fn view(result: &CallToolResult) -> SearchView {
        serde_json::from_value(output(result)).unwrap()
    }

    #[tokio::test]
    async fn test_search_renders_remote_results() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(rust_payload()));
        let orchestrator = orchestrator(source, true);

        let result = search_impl(&orchestrator, SearchParams { query: "rust".into(), lucky: false }).await.unwrap();
        let view = view(&result);

        assert_eq!(view.state, SearchState::Rendered);
        assert_eq!(view.source, Some(ResultSource::Remote));
        assert_eq!(view.page.results.len(), 2);
        assert_eq!(view.page.external_link.as_deref(), Some("https://duckduckgo.com/?q=rust"));
        assert!(!view.page.offline_banner);
        assert!(view.page.navigated_to.is_none());
    }

    #[tokio::test]
    async fn test_lucky_search_navigates() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(rust_payload()));
        let orchestrator = orchestrator(source, true);

        let result = search_impl(&orchestrator, SearchParams { query: "rust".into(), lucky: true }).await.unwrap();
        let view = view(&result);

        assert_eq!(
            view.page.navigated_to.as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)")
        );
    }

    #[tokio::test]
    async fn test_lucky_repeat_shows_held_results() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(rust_payload()));
        let orchestrator = orchestrator(source, true);

        let first = view(&search_impl(&orchestrator, SearchParams { query: "rust".into(), lucky: false }).await.unwrap());
        let second = view(&search_impl(&orchestrator, SearchParams { query: "Rust".into(), lucky: true }).await.unwrap());

        assert_eq!(second.source, Some(ResultSource::Session));
        assert_eq!(second.page.results, first.page.results);
        assert_eq!(second.page.results.len(), 2);
        assert_eq!(second.page.status, first.page.status);
        assert_eq!(second.page.external_link.as_deref(), Some("https://duckduckgo.com/?q=rust"));
        assert_eq!(
            second.page.navigated_to.as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)")
        );
    }

    #[tokio::test]
    async fn test_search_failure_without_snapshot() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Err(FetchError::Timeout));
        let orchestrator = orchestrator(source, true);

        let result = search_impl(&orchestrator, SearchParams { query: "rust".into(), lucky: false }).await.unwrap();
        let view = view(&result);

        assert_eq!(view.state, SearchState::Failed);
        assert!(view.page.empty_state.is_some());
        assert!(view.page.results.is_empty());
    }

    #[tokio::test]
    async fn test_search_offline_shows_banner() {
        let orchestrator = orchestrator(Arc::new(ScriptedSource::default()), false);

        let result = search_impl(&orchestrator, SearchParams { query: "rust".into(), lucky: false }).await.unwrap();
        let view = view(&result);

        assert!(view.page.offline_banner);
        assert_eq!(view.state, SearchState::Failed);
    }

    #[tokio::test]
    async fn test_restore_prefers_explicit_query() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(rust_payload()));
        let orchestrator = orchestrator(source, true);

        let params = RestoreParams { query: Some("  rust ".into()) };
        let view = view(&restore_impl(&orchestrator, Some("ignored"), params).await.unwrap());

        assert_eq!(view.source, Some(ResultSource::Remote));
        assert_eq!(view.page.external_link.as_deref(), Some("https://duckduckgo.com/?q=rust"));
    }

    #[tokio::test]
    async fn test_restore_uses_startup_query() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(rust_payload()));
        let orchestrator = orchestrator(source, true);

        let view = view(&restore_impl(&orchestrator, Some("rust"), RestoreParams::default()).await.unwrap());
        assert_eq!(view.source, Some(ResultSource::Remote));
    }

    #[tokio::test]
    async fn test_restore_shows_last_search_without_network() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(rust_payload()));
        let orchestrator = orchestrator(source, true);
        search_impl(&orchestrator, SearchParams { query: "rust".into(), lucky: false }).await.unwrap();

        let view = view(&restore_impl(&orchestrator, None, RestoreParams { query: Some("   ".into()) }).await.unwrap());

        assert_eq!(view.source, Some(ResultSource::LastSearch));
        assert_eq!(view.page.results.len(), 2);
    }

    #[tokio::test]
    async fn test_restore_with_nothing_stays_idle() {
        let orchestrator = orchestrator(Arc::new(ScriptedSource::default()), true);

        let view = view(&restore_impl(&orchestrator, None, RestoreParams::default()).await.unwrap());
        assert_eq!(view.state, SearchState::Idle);
        assert!(view.page.results.is_empty());
    }
}
