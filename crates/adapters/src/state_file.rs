//! File-backed keyed state store
//!
//! All entries live in one JSON object keyed by state key. The file is read on
//! every lookup and rewritten on every save.

use hash_history_domain::{KeyedStateStore, StateError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

type Entries = BTreeMap<String, Value>;

#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries, StateError> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn store(&self, entries: &Entries) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyedStateStore for JsonFileStateStore {
    fn read_state(&self, key: &str) -> Result<Option<Value>, StateError> {
        Ok(self.load()?.remove(key))
    }

    fn save_state(&self, key: &str, state: Option<&Value>) -> Result<(), StateError> {
        let mut entries = self.load()?;
        match state {
            Some(state) => {
                entries.insert(key.to_string(), state.clone());
            }
            None => {
                entries.remove(key);
            }
        }
        self.store(&entries)
    }
}
