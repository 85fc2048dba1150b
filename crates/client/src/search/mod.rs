//! Search orchestration with offline and error fallback.
//!
//! One call to [`SearchOrchestrator::search`] walks `Idle → Searching →
//! {Rendered, Failed}`:
//!
//! - **Offline**: only the persisted snapshot is consulted, and only when it
//!   was taken for the same query (ignoring case).
//! - **Online**: the instant-answer API is queried; a success is rendered and
//!   becomes the new snapshot. Any failure falls back to whatever snapshot
//!   exists, leaving it untouched.
//! - **Lucky**: a rendered, non-empty list navigates to its first http(s) result.
//!
//! Concurrent searches are not sequenced: each one overwrites the session and
//! the snapshot when it completes, so the last to finish wins.

pub mod connectivity;
pub mod navigate;
pub mod sink;

pub use connectivity::Connectivity;
pub use navigate::{check_target, first_safe_result};
pub use sink::{EmptyState, PresentationSink, RecordingSink, StatusLine, Tone};

use std::sync::{Arc, Mutex, PoisonError};

use justsearch_core::{Error, SearchResult, SnapshotStore};
use serde::{Deserialize, Serialize};

use crate::ddg::{AnswerSource, normalize};

mod messages {
    pub const ENTER_QUERY: &str = "Enter a search term to begin.";
    pub const SEARCHING: &str = "Searching...";
    pub const OFFLINE_CACHED: &str = "Offline. Showing cached results.";
    pub const OFFLINE_MISS: &str = "No cached results for this query.";
    pub const NETWORK_CACHED: &str = "Network error. Showing cached results instead.";
    pub const SEARCH_FAILED: &str = "Search failed. Please try again.";
    pub const LAST_SEARCH: &str = "Showing cached results from your last search.";
    pub const NO_SAFE_RESULT: &str = "No safe result to open.";
    pub const NO_RESULTS_TO_OPEN: &str = "No results to open.";
    pub const NO_CACHED_TO_OPEN: &str = "No cached results to open.";

    pub const EMPTY_OFFLINE: (&str, &str) = ("Offline right now.", "Connect to the internet to fetch new results.");
    pub const EMPTY_NO_MATCHES: (&str, &str) =
        ("No matches found.", "Try a broader query or open the full search page.");
    pub const EMPTY_FAILED: (&str, &str) = ("Search failed.", "Please try again in a moment.");

    pub fn no_results(query: &str) -> String {
        format!("No results found for \"{query}\".")
    }

    pub fn showing(count: usize, query: &str) -> String {
        format!("Showing {count} results for \"{query}\".")
    }
}

/// Where a search ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Idle,
    Searching,
    Rendered,
    Failed,
}

/// What a rendered result list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// A fresh instant-answer lookup.
    Remote,
    /// The snapshot for the same query, while offline.
    OfflineSnapshot,
    /// Whatever snapshot existed, after the lookup failed.
    FallbackSnapshot,
    /// The snapshot restored passively on initial load.
    LastSearch,
    /// The results already on screen, reused by the lucky shortcut.
    Session,
}

/// Final result of one orchestrated call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub state: SearchState,
    pub source: Option<ResultSource>,
    pub results: Vec<SearchResult>,
    pub navigated_to: Option<String>,
}

impl SearchOutcome {
    fn idle() -> Self {
        Self { state: SearchState::Idle, source: None, results: Vec::new(), navigated_to: None }
    }

    fn failed() -> Self {
        Self { state: SearchState::Failed, source: None, results: Vec::new(), navigated_to: None }
    }

    fn rendered(source: ResultSource, results: Vec<SearchResult>) -> Self {
        Self { state: SearchState::Rendered, source: Some(source), results, navigated_to: None }
    }
}

/// The most recently rendered list.
#[derive(Debug, Default)]
struct SearchSession {
    last_query: String,
    last_results: Vec<SearchResult>,
}

/// Coordinates connectivity, the remote lookup, the snapshot and the sink.
pub struct SearchOrchestrator {
    source: Arc<dyn AnswerSource>,
    snapshots: SnapshotStore,
    connectivity: Connectivity,
    external_search_url: url::Url,
    session: Mutex<SearchSession>,
}

impl SearchOrchestrator {
    pub fn new(
        source: Arc<dyn AnswerSource>, snapshots: SnapshotStore, connectivity: Connectivity, external_search_url: &str,
    ) -> Result<Self, Error> {
        let external_search_url = url::Url::parse(external_search_url)
            .map_err(|e| Error::InvalidInput(format!("invalid external search url: {e}")))?;

        Ok(Self { source, snapshots, connectivity, external_search_url, session: Mutex::default() })
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Link to the full search engine page for `query`.
    pub fn external_link(&self, query: &str) -> String {
        let mut link = self.external_search_url.clone();
        if query.is_empty() {
            link.set_query(None);
        } else {
            link.set_query(Some(&format!("q={}", urlencoding::encode(query))));
        }
        link.to_string()
    }

    /// Record a connectivity change and update the offline banner.
    pub fn connectivity_changed(&self, online: bool, sink: &mut dyn PresentationSink) {
        let was_online = self.connectivity.set_online(online);
        if was_online != online {
            tracing::info!(online, "connectivity changed");
        }
        sink.set_offline_banner(!online);
    }

    /// Run a full search for `query`.
    pub async fn search(&self, query: &str, lucky: bool, sink: &mut dyn PresentationSink) -> SearchOutcome {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            sink.set_status(messages::ENTER_QUERY, Tone::Error);
            return SearchOutcome::idle();
        }

        sink.set_external_link(&self.external_link(trimmed));
        sink.set_status(messages::SEARCHING, Tone::None);
        sink.render(&[]);
        sink.clear_empty_state();

        if !self.connectivity.is_online() {
            return self.search_offline(trimmed, lucky, sink).await;
        }

        match self.source.fetch(trimmed).await {
            Ok(payload) => {
                let results = normalize(payload);
                self.show_results(trimmed, &results, sink);

                if let Err(e) = self.snapshots.save(trimmed, &results).await {
                    tracing::warn!("failed to save snapshot: {}", e);
                }

                if results.is_empty() {
                    sink.set_status(&messages::no_results(trimmed), Tone::Error);
                } else {
                    sink.set_status(&messages::showing(results.len(), trimmed), Tone::Success);
                }

                let mut outcome = SearchOutcome::rendered(ResultSource::Remote, results);
                if lucky {
                    outcome.navigated_to = self.finish_lucky(&outcome.results, messages::NO_RESULTS_TO_OPEN, sink);
                }
                outcome
            }
            Err(e) => {
                tracing::warn!("search for {:?} failed: {}", trimmed, e);
                let Some(cached) = self.snapshots.load().await else {
                    sink.set_empty_state(messages::EMPTY_FAILED.0, messages::EMPTY_FAILED.1);
                    sink.set_status(messages::SEARCH_FAILED, Tone::Error);
                    return SearchOutcome::failed();
                };

                self.show_results(&cached.query, &cached.results, sink);
                sink.set_status(messages::NETWORK_CACHED, Tone::Error);

                let mut outcome = SearchOutcome::rendered(ResultSource::FallbackSnapshot, cached.results);
                if lucky {
                    outcome.navigated_to = self.finish_lucky(&outcome.results, messages::NO_CACHED_TO_OPEN, sink);
                }
                outcome
            }
        }
    }

    /// "I'm feeling lucky": reuse the results on screen for the same query,
    /// otherwise search and navigate.
    pub async fn lucky(&self, query: &str, sink: &mut dyn PresentationSink) -> SearchOutcome {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            sink.set_status(messages::ENTER_QUERY, Tone::Error);
            return SearchOutcome::idle();
        }

        let held = {
            let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            let matches = session.last_query.to_lowercase() == trimmed.to_lowercase();
            (matches && !session.last_results.is_empty())
                .then(|| (session.last_query.clone(), session.last_results.clone()))
        };

        match held {
            Some((held_query, results)) => {
                tracing::debug!("lucky shortcut for {:?}", trimmed);
                sink.set_external_link(&self.external_link(&held_query));
                sink.clear_empty_state();
                sink.render(&results);
                sink.set_status(&messages::showing(results.len(), &held_query), Tone::Success);

                let mut outcome = SearchOutcome::rendered(ResultSource::Session, results);
                outcome.navigated_to = self.open_first_result(&outcome.results, sink);
                outcome
            }
            None => self.search(trimmed, true, sink).await,
        }
    }

    /// Initial load: search for `startup_query` if given, otherwise show the
    /// last snapshot without touching the network.
    pub async fn restore(&self, startup_query: Option<&str>, sink: &mut dyn PresentationSink) -> SearchOutcome {
        sink.set_offline_banner(!self.connectivity.is_online());

        if let Some(query) = startup_query.filter(|q| !q.trim().is_empty()) {
            return self.search(query, false, sink).await;
        }

        let Some(cached) = self.snapshots.load().await else {
            return SearchOutcome::idle();
        };

        sink.set_external_link(&self.external_link(&cached.query));
        self.show_results(&cached.query, &cached.results, sink);
        sink.set_status(messages::LAST_SEARCH, Tone::Success);
        SearchOutcome::rendered(ResultSource::LastSearch, cached.results)
    }

    async fn search_offline(&self, query: &str, lucky: bool, sink: &mut dyn PresentationSink) -> SearchOutcome {
        let cached = self.snapshots.load().await.filter(|snapshot| snapshot.matches_query(query));

        let Some(cached) = cached else {
            tracing::debug!("offline with no snapshot for {:?}", query);
            sink.set_empty_state(messages::EMPTY_OFFLINE.0, messages::EMPTY_OFFLINE.1);
            sink.set_status(messages::OFFLINE_MISS, Tone::Error);
            return SearchOutcome::failed();
        };

        self.show_results(&cached.query, &cached.results, sink);
        sink.set_status(messages::OFFLINE_CACHED, Tone::Success);

        let mut outcome = SearchOutcome::rendered(ResultSource::OfflineSnapshot, cached.results);
        if lucky {
            outcome.navigated_to = self.finish_lucky(&outcome.results, messages::NO_CACHED_TO_OPEN, sink);
        }
        outcome
    }

    /// Remember `results` as the session's list and render them.
    fn show_results(&self, query: &str, results: &[SearchResult], sink: &mut dyn PresentationSink) {
        {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            session.last_query = query.to_string();
            session.last_results = results.to_vec();
        }

        sink.clear_empty_state();
        sink.render(results);
        if results.is_empty() {
            sink.set_empty_state(messages::EMPTY_NO_MATCHES.0, messages::EMPTY_NO_MATCHES.1);
        }
    }

    fn finish_lucky(
        &self, results: &[SearchResult], empty_message: &str, sink: &mut dyn PresentationSink,
    ) -> Option<String> {
        if results.is_empty() {
            sink.set_status(empty_message, Tone::Error);
            return None;
        }
        self.open_first_result(results, sink)
    }

    fn open_first_result(&self, results: &[SearchResult], sink: &mut dyn PresentationSink) -> Option<String> {
        let Some(target) = first_safe_result(results) else {
            sink.set_status(messages::NO_SAFE_RESULT, Tone::Error);
            return None;
        };

        tracing::info!(url = %target.url, "navigating to first result");
        sink.navigate(&target.url);
        Some(target.url.clone())
    }
}
