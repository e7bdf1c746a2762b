//! Query-key codec: embeds an opaque state key in a hash path's query string
//!
//! Only alphanumeric key values are recognized when stripping or extracting.
//! Values with other characters are appended verbatim but never round-trip.
//! Word boundaries are ASCII: any non-ASCII character ends a key value.

use regex::Regex;

use crate::model::HashHistoryOptions;

/// Append `key=value` to the query string of `path`
pub fn append_query_value(path: &str, key: &str, value: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", path, separator, key, value)
}

/// Remove the first `key=<alnum>` pair (and its separator) from `path`
pub fn strip_query_value(path: &str, key: &str) -> String {
    QueryKeyCodec::new(key).strip(path)
}

/// Extract the value of `key` from the query string of `path`
pub fn query_value(path: &str, key: &str) -> Option<String> {
    QueryKeyCodec::new(key).extract(path)
}

/// Codec bound to a single query parameter name, with its patterns compiled once
#[derive(Debug, Clone)]
pub struct QueryKeyCodec {
    name: String,
    extract_pattern: Regex,
    strip_pattern: Regex,
}

impl QueryKeyCodec {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let escaped = regex::escape(&name);

        let extract_pattern =
            Regex::new(&format!(r"\?.*?(?-u:\b){}=(.+?)(?-u:\b)", escaped)).expect("Valid regex");
        let strip_pattern =
            Regex::new(&format!(r"[?&]?{}=[a-zA-Z0-9]+", escaped)).expect("Valid regex");

        Self {
            name,
            extract_pattern,
            strip_pattern,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn append(&self, path: &str, value: &str) -> String {
        append_query_value(path, &self.name, value)
    }

    pub fn strip(&self, path: &str) -> String {
        self.strip_pattern.replace(path, "").into_owned()
    }

    pub fn extract(&self, path: &str) -> Option<String> {
        self.extract_pattern
            .captures(path)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
    }
}

/// Keyed-state mode, chosen once when a history is constructed
#[derive(Debug, Clone)]
pub enum QueryKeyMode {
    /// No key extraction, no state persistence, no embedded parameter
    Keyless,
    /// State is persisted under a key embedded in the hash query string
    Keyed(QueryKeyCodec),
}

impl QueryKeyMode {
    pub fn from_options(options: &HashHistoryOptions) -> Self {
        match options.query_key() {
            Some(name) => QueryKeyMode::Keyed(QueryKeyCodec::new(name)),
            None => QueryKeyMode::Keyless,
        }
    }

    pub fn codec(&self) -> Option<&QueryKeyCodec> {
        match self {
            QueryKeyMode::Keyless => None,
            QueryKeyMode::Keyed(codec) => Some(codec),
        }
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self, QueryKeyMode::Keyed(_))
    }
}
