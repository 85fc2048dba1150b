//! Instant-answer API request parameters.

/// Query string of one instant-answer lookup.
///
/// Output is always JSON with HTML stripped, and the API is told not to
/// redirect bang queries or expand disambiguation pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantAnswerRequest {
    pub q: String,
    pub format: &'static str,
    pub no_redirect: u8,
    pub no_html: u8,
    pub skip_disambig: u8,
}

impl InstantAnswerRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { q: query.into(), format: "json", no_redirect: 1, no_html: 1, skip_disambig: 1 }
    }

    /// Build the full request URL against `base`.
    pub fn to_url(&self, base: &url::Url) -> url::Url {
        let mut url = base.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("q", &self.q)
            .append_pair("format", self.format)
            .append_pair("no_redirect", &self.no_redirect.to_string())
            .append_pair("no_html", &self.no_html.to_string())
            .append_pair("skip_disambig", &self.skip_disambig.to_string());
        url
    }
}
