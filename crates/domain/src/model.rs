//! Domain models and value objects

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Query parameter name used for keyed state when none is configured
pub const DEFAULT_QUERY_KEY: &str = "_k";

/// Kind of navigation that produced a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// A new navigable entry was added
    Push,
    /// The current entry was overwritten
    Replace,
    /// The platform moved the session position (back/forward, manual edit)
    #[default]
    Pop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Push => "PUSH",
            Action::Replace => "REPLACE",
            Action::Pop => "POP",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A structured application location
///
/// Locations are immutable once built; navigation produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Path portion, always starting with `/` when read from a hash
    pub pathname: String,
    /// Query portion including its leading `?`, or empty
    pub search: String,
    /// Opaque state recovered from the keyed state store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    /// Key referencing the persisted state, when keying is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// How this location was reached
    #[serde(default)]
    pub action: Action,
}

impl Location {
    /// Build a location from a `<pathname><?search>` path
    pub fn from_path(
        path: &str,
        state: Option<Value>,
        action: Action,
        key: Option<String>,
    ) -> Self {
        let (pathname, search) = match path.find('?') {
            Some(index) => path.split_at(index),
            None => (path, ""),
        };

        Self {
            pathname: pathname.to_string(),
            search: search.to_string(),
            state,
            key,
            action,
        }
    }

    /// Pathname followed by search, without any embedded state key
    pub fn path(&self) -> String {
        format!("{}{}", self.pathname, self.search)
    }
}

/// Raw `queryKey` option as it appears in configuration
///
/// Accepts either a boolean or a parameter name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryKeySetting {
    Enabled(bool),
    Named(String),
}

impl QueryKeySetting {
    /// Resolve to the parameter name, or `None` when keyed state is disabled
    pub fn resolve(setting: Option<&QueryKeySetting>) -> Option<String> {
        match setting {
            None | Some(QueryKeySetting::Enabled(true)) => Some(DEFAULT_QUERY_KEY.to_string()),
            Some(QueryKeySetting::Enabled(false)) => None,
            Some(QueryKeySetting::Named(name)) if name.is_empty() => None,
            Some(QueryKeySetting::Named(name)) => Some(name.clone()),
        }
    }
}

/// Options recognized when constructing a hash history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashHistoryOptions {
    /// `false`/empty disables keyed state, a string names the parameter,
    /// anything else (or omission) uses `_k`
    #[serde(default)]
    pub query_key: Option<QueryKeySetting>,
}

impl HashHistoryOptions {
    pub fn keyless() -> Self {
        Self {
            query_key: Some(QueryKeySetting::Enabled(false)),
        }
    }

    pub fn with_query_key(name: impl Into<String>) -> Self {
        Self {
            query_key: Some(QueryKeySetting::Named(name.into())),
        }
    }

    /// Effective query parameter name, `None` when keying is disabled
    pub fn query_key(&self) -> Option<String> {
        QueryKeySetting::resolve(self.query_key.as_ref())
    }
}

/// What `finish_transition` did with an accepted transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    /// POP transitions already reflect the hash
    Ignored,
    /// The target hash equals the current one; nothing was written
    Unchanged { action: Action },
    /// The hash was written
    Written { action: Action, path: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_path_splits_search() {
        let location = Location::from_path("/users/42?tab=posts", None, Action::Pop, None);
        assert_eq!(location.pathname, "/users/42");
        assert_eq!(location.search, "?tab=posts");
        assert_eq!(location.path(), "/users/42?tab=posts");
    }

    #[test]
    fn test_from_path_without_search() {
        let location = Location::from_path("/", None, Action::Pop, None);
        assert_eq!(location.pathname, "/");
        assert_eq!(location.search, "");
    }

    #[test]
    fn test_action_serializes_uppercase() {
        let value = serde_json::to_value(Action::Replace).unwrap();
        assert_eq!(value, json!("REPLACE"));
        assert_eq!(Action::Push.to_string(), "PUSH");
    }

    #[test]
    fn test_query_key_resolution() {
        assert_eq!(HashHistoryOptions::default().query_key(), Some("_k".to_string()));
        assert_eq!(HashHistoryOptions::keyless().query_key(), None);
        assert_eq!(HashHistoryOptions::with_query_key("").query_key(), None);
        assert_eq!(
            HashHistoryOptions::with_query_key("sk").query_key(),
            Some("sk".to_string())
        );
        assert_eq!(
            QueryKeySetting::resolve(Some(&QueryKeySetting::Enabled(true))),
            Some("_k".to_string())
        );
    }

    #[test]
    fn test_query_key_setting_deserializes_bool_or_string() {
        let options: HashHistoryOptions = serde_json::from_value(json!({ "query_key": false })).unwrap();
        assert_eq!(options.query_key(), None);

        let options: HashHistoryOptions = serde_json::from_value(json!({ "query_key": "key" })).unwrap();
        assert_eq!(options.query_key(), Some("key".to_string()));

        let options: HashHistoryOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options.query_key(), Some("_k".to_string()));
    }
}
