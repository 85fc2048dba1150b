//! Search result record shared by the fetcher, the snapshot store and the presentation layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single rendered search result.
///
/// The URL is the identity of a result: two records with the same URL are
/// duplicates and only the first one survives normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>, url: impl Into<String>) -> Self {
        Self { title: title.into(), snippet: snippet.into(), url: url.into() }
    }
}
