//! In-memory keyed state store for testing and single-session use

use hash_history_domain::{KeyedStateStore, StateError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory keyed state store implementation
pub struct InMemoryStateStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize, StateError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StateError::Storage(e.to_string()))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StateError> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedStateStore for InMemoryStateStore {
    fn read_state(&self, key: &str) -> Result<Option<Value>, StateError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StateError::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save_state(&self, key: &str, state: Option<&Value>) -> Result<(), StateError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StateError::Storage(e.to_string()))?;
        match state {
            Some(state) => {
                entries.insert(key.to_string(), state.clone());
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(())
    }
}
