//! Safety gate for "lucky" navigation.

use justsearch_core::{Error, SearchResult};

/// Check that `target` parses as an absolute http(s) URL.
pub fn check_target(target: &str) -> Result<url::Url, Error> {
    let parsed = url::Url::parse(target.trim()).map_err(|e| Error::UnsafeTarget(format!("{target}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::UnsafeTarget(format!("{target}: scheme {scheme} is not allowed"))),
    }
}

/// First result, in order, whose URL passes [`check_target`].
pub fn first_safe_result(results: &[SearchResult]) -> Option<&SearchResult> {
    results.iter().find(|result| match check_target(&result.url) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("skipping navigation target: {}", e);
            false
        }
    })
}
