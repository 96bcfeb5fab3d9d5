//! LocalCache trait - the durable local mirror of the last known value.
//!
//! The cache is a plain key to serialized-bytes mapping with no expiry. It
//! survives process restarts and is a cache, never a source of truth once an
//! identity is connected. Only store operations mutate it; different store
//! instances touch different keys, so single-key access is never concurrent.

use async_trait::async_trait;

use crate::error::Result;

/// The local persistent key-value cache collaborator.
///
/// Backends: [`SqliteCache`](crate::sqlite::SqliteCache) for durable storage,
/// [`MemoryCache`](crate::memory::MemoryCache) for tests and ephemeral use.
/// Code should depend on this trait, not specific implementations.
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Get the serialized value for a key.
    ///
    /// Returns `None` if the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a key to a serialized value, creating or replacing it.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Check if a key is present.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
