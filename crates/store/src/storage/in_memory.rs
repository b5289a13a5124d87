use std::collections::HashMap;
use std::sync::RwLock;

use super::r#trait::{KeyValueStorage, StorageError};

/// In-memory key/value storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    inner: RwLock<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key (handy for simulating payloads left by older clients).
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key.into(), value.into());
        }
        self
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        map.remove(key);
        Ok(())
    }
}
