//! Backing store port.
//!
//! The tapestry needs nothing from its persistence layer beyond reading and
//! writing whole string values under a key. Keeping the port this small lets
//! tests use an in-memory fake and lets hosts plug in files, SQLite, or any
//! other key-value backend.

use async_trait::async_trait;

use crate::error::Result;

/// Minimal async key-value store.
///
/// Implementations must ensure:
/// - `set` replaces the whole value atomically where the backend allows it
/// - `get` returns exactly the last value written under the key
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing was written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe() {
        fn _accepts_dyn_store(_store: &dyn KeyValueStore) {}
        fn _accepts_boxed(_store: Box<dyn KeyValueStore>) {}
    }
}
