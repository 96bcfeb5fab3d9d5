//! RemoteStore trait - the per-user cloud document collaborator.
//!
//! Each (identity, key) pair maps to one remote document at
//! `users/{identity}/data/{key}` holding `{ "value": ... }`. The remote is
//! authoritative once connected; its own connection semantics govern retry
//! and backoff, outside this crate's responsibility.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::key::validate_key;
use crate::snapshot::SnapshotStream;

/// An authenticated-user token. Absent identity means local-only mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a remote document: `users/{identity}/data/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath(String);

impl DocPath {
    /// Build the document path for an identity and store key.
    pub fn new(identity: &Identity, key: &str) -> Result<Self> {
        validate_key(key)?;
        Ok(Self(format!("users/{}/data/{}", identity.as_str(), key)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire body of a remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    /// The stored payload, opaque to the store.
    pub value: serde_json::Value,
}

/// The remote document store collaborator.
///
/// Implementations wrap a hosted document database. The crate ships
/// [`MemoryRemote`](crate::memory::MemoryRemote) for tests and development.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Open a live subscription to a document.
    ///
    /// The returned stream yields the document's current state first
    /// (including confirmed absence), then one snapshot per change.
    /// Dropping the stream releases the subscription.
    fn subscribe(&self, path: &DocPath) -> Result<SnapshotStream>;

    /// Write `{ value }` to a document, creating it if absent.
    ///
    /// Last write wins; concurrent writers are not merged.
    async fn upsert(&self, path: &DocPath, value: serde_json::Value) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;

    #[test]
    fn test_doc_path_shape() {
        let identity = Identity::new("u1");
        let path = DocPath::new(&identity, "primal-homework").unwrap();
        assert_eq!(path.as_str(), "users/u1/data/primal-homework");
    }

    #[test]
    fn test_doc_path_rejects_bad_key() {
        let identity = Identity::new("u1");
        let err = DocPath::new(&identity, "nested/key").unwrap_err();
        assert!(matches!(err, SyncError::InvalidKey(_)));
    }

    #[test]
    fn test_remote_document_wire_shape() {
        let doc = RemoteDocument {
            value: serde_json::json!([{"id": "1", "title": "x"}]),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"value":[{"id":"1","title":"x"}]}"#);
    }
}
