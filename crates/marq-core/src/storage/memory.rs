//! In-memory store for tests and embedding hosts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::traits::KeyValueStore;
use crate::error::{Result, TapestryError};

/// A `HashMap`-backed store. Values vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with one value.
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        store
    }

    /// Read a value without going through the async port.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock_values().ok()?.get(key).cloned()
    }

    /// Overwrite a value without going through the async port.
    pub fn put_raw(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.lock_values() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    fn lock_values(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| TapestryError::Storage("Memory store poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock_values()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock_values()?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
