//! Tapestry configuration.

use serde::{Deserialize, Serialize};

/// Default backing store key for the thread list.
pub const DEFAULT_STORAGE_KEY: &str = "marq_tapestry_threads";

/// Largest scroll accepted by import, in bytes (5 MiB).
pub const DEFAULT_MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

/// Most threads accepted in one scroll.
pub const DEFAULT_MAX_IMPORT_THREADS: usize = 1000;

/// Settings for one tapestry instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapestryConfig {
    /// Key the thread list (or its envelope) is stored under
    pub storage_key: String,

    pub max_import_bytes: usize,

    pub max_import_threads: usize,
}

impl Default for TapestryConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
            max_import_threads: DEFAULT_MAX_IMPORT_THREADS,
        }
    }
}

impl TapestryConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}
