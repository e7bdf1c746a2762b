//! Configuration loading and management

use anyhow::{Context, Result};
use hash_history_domain::{HashHistoryOptions, QueryKeySetting};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::args::QueryKeyArgs;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// `false` disables keyed state, a string names the query parameter
    #[serde(default)]
    pub query_key: Option<QueryKeySetting>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub backend: StateBackend,

    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("./history-state.json")
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::default(),
            path: default_state_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./hash-history.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("HASH_HISTORY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// History options with command-line overrides applied
    pub fn history_options(&self, overrides: &QueryKeyArgs) -> HashHistoryOptions {
        let query_key = if overrides.no_query_key {
            Some(QueryKeySetting::Enabled(false))
        } else if let Some(ref name) = overrides.query_key {
            Some(QueryKeySetting::Named(name.clone()))
        } else {
            self.history.query_key.clone()
        };

        HashHistoryOptions { query_key }
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# hash-history configuration

[general]
log_level = "info"

[history]
# Query parameter carrying the keyed-state key; false disables keyed state
query_key = "_k"

[state]
backend = "memory"  # memory, file
path = "./history-state.json"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.state.backend, StateBackend::Memory);
        assert_eq!(
            config.history_options(&QueryKeyArgs::default()).query_key(),
            Some("_k".to_string())
        );
    }

    #[test]
    fn test_query_key_false_disables_keying() {
        let config: AppConfig = toml::from_str("[history]\nquery_key = false\n").unwrap();
        assert_eq!(config.history_options(&QueryKeyArgs::default()).query_key(), None);
    }

    #[test]
    fn test_cli_overrides_config() {
        let config: AppConfig = toml::from_str("[history]\nquery_key = false\n").unwrap();
        let overrides = QueryKeyArgs {
            query_key: Some("sk".to_string()),
            no_query_key: false,
        };
        assert_eq!(
            config.history_options(&overrides).query_key(),
            Some("sk".to_string())
        );

        let disabled = QueryKeyArgs {
            query_key: None,
            no_query_key: true,
        };
        assert_eq!(AppConfig::default().history_options(&disabled).query_key(), None);
    }
}
