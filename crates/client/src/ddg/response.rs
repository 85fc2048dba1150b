//! Instant-answer response schema and normalization.
//!
//! The API returns loosely typed JSON: fields may be missing, null, or of an
//! unexpected type depending on the query. Every field here is optional and
//! decoded leniently, so normalization is total over any JSON value.

use std::collections::HashSet;

use justsearch_core::SearchResult;
use serde::Deserialize;
use serde_json::Value;

/// Title used for the abstract answer when the payload has no heading.
pub const DEFAULT_ABSTRACT_TITLE: &str = "Instant Answer";

/// Snippet used for a related topic whose text has nothing after the title.
pub const DEFAULT_TOPIC_SNIPPET: &str = "DuckDuckGo related topic";

const TITLE_DELIMITER: &str = " - ";

/// The parts of an instant-answer payload that produce results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InstantAnswer {
    #[serde(rename = "Heading", default, deserialize_with = "lenient::string")]
    pub heading: Option<String>,
    #[serde(rename = "AbstractText", default, deserialize_with = "lenient::string")]
    pub abstract_text: Option<String>,
    #[serde(rename = "AbstractURL", default, deserialize_with = "lenient::string")]
    pub abstract_url: Option<String>,
    #[serde(rename = "RelatedTopics", default, deserialize_with = "lenient::topics")]
    pub related_topics: Vec<RelatedTopic>,
}

/// A node of the related-topic tree: either a named group of sub-topics or a leaf.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RelatedTopic {
    #[serde(rename = "FirstURL", default, deserialize_with = "lenient::string")]
    pub first_url: Option<String>,
    #[serde(rename = "Text", default, deserialize_with = "lenient::string")]
    pub text: Option<String>,
    #[serde(rename = "Topics", default, deserialize_with = "lenient::group")]
    pub topics: Option<Vec<RelatedTopic>>,
}

impl InstantAnswer {
    /// Decode a payload, treating anything that is not a JSON object as empty.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Flatten into ordered, URL-unique results with the abstract answer first.
    pub fn into_results(self) -> Vec<SearchResult> {
        let mut results = Vec::new();
        let mut seen = HashSet::new();

        if let (Some(url), Some(text)) = (non_empty(&self.abstract_url), non_empty(&self.abstract_text)) {
            let title = non_empty(&self.heading).unwrap_or(DEFAULT_ABSTRACT_TITLE);
            seen.insert(url.to_string());
            results.push(SearchResult::new(title, text, url));
        }

        let mut leaves = Vec::new();
        flatten(&self.related_topics, &mut leaves);

        for (url, text) in leaves {
            if !seen.insert(url.to_string()) {
                continue;
            }
            let (title, snippet) = split_topic_text(text);
            results.push(SearchResult::new(title, snippet, url));
        }

        results
    }
}

/// Normalize a raw API payload into results.
pub fn normalize(payload: Value) -> Vec<SearchResult> {
    InstantAnswer::from_value(payload).into_results()
}

/// Split a topic text into title and snippet on the first `" - "`.
pub fn split_topic_text(text: &str) -> (&str, &str) {
    let (head, rest) = text.split_once(TITLE_DELIMITER).unwrap_or((text, ""));
    let title = if head.is_empty() { text } else { head };
    let snippet = if rest.is_empty() { DEFAULT_TOPIC_SNIPPET } else { rest };
    (title, snippet)
}

/// Depth-first walk collecting `(url, text)` of every usable leaf in source order.
fn flatten<'a>(topics: &'a [RelatedTopic], leaves: &mut Vec<(&'a str, &'a str)>) {
    for topic in topics {
        if let Some(group) = &topic.topics {
            flatten(group, leaves);
        } else if let (Some(url), Some(text)) = (non_empty(&topic.first_url), non_empty(&topic.text)) {
            leaves.push((url, text));
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::RelatedTopic;

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map(str::to_owned))
    }

    pub fn topics<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RelatedTopic>, D::Error> {
        Ok(group(deserializer)?.unwrap_or_default())
    }

    pub fn group<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<RelatedTopic>>, D::Error> {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(None);
        };
        let topics = items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        Ok(Some(topics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIXTURE_JSON: &str = r#"{
        "Heading": "Rust (programming language)",
        "AbstractText": "Rust is a general-purpose programming language.",
        "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
        "RelatedTopics": [
            {
                "FirstURL": "https://duckduckgo.com/Cargo",
                "Text": "Cargo - The Rust package manager.",
                "Icon": {"URL": ""}
            },
            {
                "Name": "See also",
                "Topics": [
                    {"FirstURL": "https://duckduckgo.com/Servo", "Text": "Servo - A browser engine."},
                    {"FirstURL": "https://duckduckgo.com/Cargo", "Text": "Cargo - Duplicate entry."}
                ]
            },
            {"FirstURL": "https://duckduckgo.com/Ferris", "Text": "Ferris"}
        ]
    }"#;

    fn fixture() -> Value {
        serde_json::from_str(FIXTURE_JSON).unwrap()
    }

    #[test]
    fn test_normalize_fixture() {
        let results = normalize(fixture());
        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://en.wikipedia.org/wiki/Rust_(programming_language)",
                "https://duckduckgo.com/Cargo",
                "https://duckduckgo.com/Servo",
                "https://duckduckgo.com/Ferris",
            ]
        );
        assert_eq!(results[0].title, "Rust (programming language)");
        assert_eq!(results[0].snippet, "Rust is a general-purpose programming language.");
        assert_eq!(results[1].title, "Cargo");
        assert_eq!(results[1].snippet, "The Rust package manager.");
        assert_eq!(results[3].title, "Ferris");
        assert_eq!(results[3].snippet, DEFAULT_TOPIC_SNIPPET);
    }

    #[test]
    fn test_abstract_without_heading_uses_default_title() {
        let results = normalize(json!({"AbstractText": "An answer.", "AbstractURL": "https://a"}));
        assert_eq!(results, vec![SearchResult::new(DEFAULT_ABSTRACT_TITLE, "An answer.", "https://a")]);
    }

    #[test]
    fn test_abstract_requires_url_and_text() {
        assert!(normalize(json!({"Heading": "H", "AbstractText": "", "AbstractURL": "https://a"})).is_empty());
        assert!(normalize(json!({"Heading": "H", "AbstractText": "text"})).is_empty());
    }

    #[test]
    fn test_abstract_then_duplicate_topics() {
        let payload = json!({
            "Heading": "Cat",
            "AbstractText": "A small carnivore.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Cat",
            "RelatedTopics": [
                {"FirstURL": "https://duckduckgo.com/Kitten", "Text": "Kitten - A young cat."},
                {"FirstURL": "https://duckduckgo.com/Kitten", "Text": "Kitten - Again."},
                {"FirstURL": "https://duckduckgo.com/Felidae", "Text": "Felidae - The cat family."}
            ]
        });

        let results = normalize(payload);
        assert_eq!(results.len(), 1 + 2);
        assert_eq!(results[0].url, "https://en.wikipedia.org/wiki/Cat");
        assert_eq!(results[1].snippet, "A young cat.");
    }

    #[test]
    fn test_topic_sharing_abstract_url_is_dropped() {
        let payload = json!({
            "AbstractText": "Answer.",
            "AbstractURL": "https://a",
            "RelatedTopics": [{"FirstURL": "https://a", "Text": "A - duplicate of the abstract"}]
        });
        assert_eq!(normalize(payload).len(), 1);
    }

    #[test]
    fn test_split_topic_text() {
        assert_eq!(split_topic_text("Title - Body"), ("Title", "Body"));
        assert_eq!(split_topic_text("A - B - C"), ("A", "B - C"));
        assert_eq!(split_topic_text("No delimiter"), ("No delimiter", DEFAULT_TOPIC_SNIPPET));
        assert_eq!(split_topic_text("Trailing - "), ("Trailing", DEFAULT_TOPIC_SNIPPET));
        assert_eq!(split_topic_text(" - Leading"), (" - Leading", "Leading"));
        assert_eq!(split_topic_text("hyphen-without-spaces"), ("hyphen-without-spaces", DEFAULT_TOPIC_SNIPPET));
    }

    #[test]
    fn test_malformed_payloads_never_fail() {
        let payloads = [
            Value::Null,
            json!([]),
            json!(["Heading", "AbstractText"]),
            json!("text"),
            json!(42),
            json!({}),
            json!({"RelatedTopics": "not a list"}),
            json!({"RelatedTopics": [null, 1, "x", {"Topics": "nope"}, {"FirstURL": 5, "Text": "T"}]}),
            json!({"Heading": 1, "AbstractText": ["x"], "AbstractURL": {"u": 1}}),
        ];

        for payload in payloads {
            assert!(normalize(payload.clone()).is_empty(), "payload {payload} produced results");
        }
    }

    #[test]
    fn test_nested_groups_depth_first() {
        let payload = json!({
            "RelatedTopics": [
                {"Topics": [
                    {"FirstURL": "https://1", "Text": "One"},
                    {"Topics": [{"FirstURL": "https://2", "Text": "Two"}]}
                ]},
                {"FirstURL": "https://3", "Text": "Three"},
                {"Topics": []}
            ]
        });

        let urls: Vec<String> = normalize(payload).into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://1", "https://2", "https://3"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        assert_eq!(normalize(fixture()), normalize(fixture()));
    }

    #[test]
    fn test_urls_unique() {
        let results = normalize(fixture());
        let unique: HashSet<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(unique.len(), results.len());
    }
}
