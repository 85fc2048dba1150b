//! Presentation boundary of the search flow.

use justsearch_core::SearchResult;
use serde::{Deserialize, Serialize};

/// Visual weight of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    None,
    Success,
    Error,
}

/// Receives everything the search flow wants shown to the user.
pub trait PresentationSink: Send {
    /// Replace the result list. An empty slice clears it.
    fn render(&mut self, results: &[SearchResult]);

    fn set_status(&mut self, message: &str, tone: Tone);

    fn set_empty_state(&mut self, title: &str, message: &str);

    fn clear_empty_state(&mut self);

    /// Point the "open full search" link somewhere new.
    fn set_external_link(&mut self, href: &str);

    fn set_offline_banner(&mut self, visible: bool);

    /// Leave the page for `url`. Only called with http(s) URLs.
    fn navigate(&mut self, url: &str);
}

/// Status line currently shown.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusLine {
    pub message: String,
    pub tone: Tone,
}

/// Empty-state panel currently shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyState {
    pub title: String,
    pub message: String,
}

/// Sink that keeps the last value of everything it was told.
///
/// Hosts without a real page (tools, tests) hand this to the orchestrator and
/// read the final view afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingSink {
    pub results: Vec<SearchResult>,
    pub status: StatusLine,
    pub empty_state: Option<EmptyState>,
    pub external_link: Option<String>,
    pub offline_banner: bool,
    pub navigated_to: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresentationSink for RecordingSink {
    fn render(&mut self, results: &[SearchResult]) {
        self.results = results.to_vec();
    }

    fn set_status(&mut self, message: &str, tone: Tone) {
        self.status = StatusLine { message: message.to_string(), tone };
    }

    fn set_empty_state(&mut self, title: &str, message: &str) {
        self.empty_state = Some(EmptyState { title: title.to_string(), message: message.to_string() });
    }

    fn clear_empty_state(&mut self) {
        self.empty_state = None;
    }

    fn set_external_link(&mut self, href: &str) {
        self.external_link = Some(href.to_string());
    }

    fn set_offline_banner(&mut self, visible: bool) {
        self.offline_banner = visible;
    }

    fn navigate(&mut self, url: &str) {
        self.navigated_to = Some(url.to_string());
    }
}
