//! In-memory implementations of the cache and remote collaborators.
//!
//! Neither backend is durable - data is lost on process exit. Use for
//! testing and development; [`MemoryRemote`] plays the role a hosted
//! document store emulator plays during development.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::LocalCache;
use crate::error::Result;
use crate::key::validate_key;
use crate::remote::{DocPath, RemoteDocument, RemoteStore};
use crate::snapshot::{Snapshot, SnapshotSender, SnapshotStream};

/// In-memory implementation of [`LocalCache`].
///
/// Uses a BTreeMap for ordered key iteration and RwLock for concurrency.
pub struct MemoryCache {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryCache {
    /// Create a new empty in-memory cache.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.data.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        validate_key(key)?;
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// In-memory implementation of [`RemoteStore`].
///
/// Documents live in a BTreeMap keyed by path, stored as their wire body
/// `{ value }`; snapshots fan out through a broadcast channel. Subscriptions
/// see the current document state as their first snapshot, then every
/// subsequent upsert, in order.
pub struct MemoryRemote {
    documents: Arc<RwLock<BTreeMap<String, RemoteDocument>>>,
    watcher: SnapshotSender,
}

impl MemoryRemote {
    /// Create a new empty in-memory remote.
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            watcher: SnapshotSender::new(1024),
        }
    }

    /// Current value of a document, if it exists. Inspection helper.
    pub fn document(&self, path: &DocPath) -> Option<serde_json::Value> {
        self.documents
            .read()
            .get(path.as_str())
            .map(|doc| doc.value.clone())
    }

    /// Push a document change as if another client wrote it.
    pub fn push(&self, path: &DocPath, value: serde_json::Value) {
        self.documents
            .write()
            .insert(path.as_str().to_string(), RemoteDocument {
                value: value.clone(),
            });
        self.watcher.send(path.as_str(), Snapshot::Document(value));
    }

    /// Number of live subscriptions across all paths.
    pub fn subscriber_count(&self) -> usize {
        self.watcher.receiver_count()
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    fn subscribe(&self, path: &DocPath) -> Result<SnapshotStream> {
        let initial = match self.documents.read().get(path.as_str()) {
            Some(doc) => Snapshot::Document(doc.value.clone()),
            None => Snapshot::Missing,
        };
        Ok(self.watcher.subscribe(path.as_str(), initial))
    }

    async fn upsert(&self, path: &DocPath, value: serde_json::Value) -> Result<()> {
        self.push(path, value);
        Ok(())
    }
}
