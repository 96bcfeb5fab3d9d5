//! # primal-sync
//!
//! Local-first state synchronization core for the Primal planner.
//!
//! Each named collection ("primal-events", "primal-homework", ...) is held
//! by a [`SyncedStore`]: a read/write handle that mirrors its value to a
//! durable local cache and, when a user identity is connected, to a per-user
//! remote document, reconciling live remote snapshots back into local state.
//!
//! - **Local-first**: writes are visible to readers and persisted to the
//!   cache before any remote round trip; reads never touch the network.
//! - **Remote-authoritative once connected**: a differing remote snapshot
//!   replaces local state; an absent document never clobbers it.
//! - **Degrade-to-local**: no cache or remote fault is fatal; remote faults
//!   are reported through an [`ErrorSink`], cache faults are logged.
//! - **Last write wins**: concurrent edits from two devices overwrite rather
//!   than merge. Known limitation.
//!
//! ## Collaborators
//!
//! - [`LocalCache`]: durable key to serialized-bytes mapping.
//!   [`SqliteCache`] for production, [`MemoryCache`] for tests.
//! - [`RemoteStore`]: per-user document store at `users/{id}/data/{key}`.
//!   [`MemoryRemote`] ships for tests and development.
//! - [`ErrorSink`]: fire-and-forget fault notification, [`LogSink`] default.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use primal_sync::{Identity, LogSink, MemoryRemote, SqliteCache, SyncedStore};
//!
//! #[tokio::main]
//! async fn main() -> primal_sync::Result<()> {
//!     let cache = Arc::new(SqliteCache::open("primal.db").await?);
//!     let remote = Arc::new(MemoryRemote::new());
//!     let sink = Arc::new(LogSink);
//!
//!     // Seeded from the cache if present, otherwise the initial value
//!     let homework: SyncedStore<Vec<String>> =
//!         SyncedStore::open("primal-homework", Vec::new(), cache, remote, sink).await?;
//!
//!     // Local-first write: in memory and cached before returning
//!     homework.set(vec!["algebra sheet".to_string()]).await;
//!
//!     // Login: mirror to users/u1/data/primal-homework from here on
//!     homework.connect(Some(Identity::new("u1")));
//!
//!     println!("{:?}", homework.get());
//!     Ok(())
//! }
//! ```
//!
//! ## Functional updates
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use primal_sync::{LogSink, MemoryCache, MemoryRemote, SyncedStore};
//! # #[tokio::main]
//! # async fn main() -> primal_sync::Result<()> {
//! # let cache = Arc::new(MemoryCache::new());
//! # let remote = Arc::new(MemoryRemote::new());
//! # let sink = Arc::new(LogSink);
//! let ideas: SyncedStore<Vec<String>> =
//!     SyncedStore::open("primal-ideas", Vec::new(), cache, remote, sink).await?;
//!
//! // The updater runs against the latest value, so back-to-back updates
//! // never work from a stale snapshot.
//! ideas
//!     .update(|v| {
//!         let mut next = v.clone();
//!         next.push("dark mode".to_string());
//!         next
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod key;
pub mod memory;
pub mod notify;
pub mod remote;
pub mod snapshot;
pub mod sqlite;
pub mod store;

// Re-export main types
pub use cache::LocalCache;
pub use error::{Result, SyncError};
pub use key::{validate_key, KEY_EVENTS, KEY_HOMEWORK, KEY_IDEAS, KEY_WORK, MAX_KEY_LENGTH};
pub use memory::{MemoryCache, MemoryRemote};
pub use notify::{ErrorSink, FaultKind, LogSink, RecordingSink};
pub use remote::{DocPath, Identity, RemoteDocument, RemoteStore};
pub use snapshot::{Snapshot, SnapshotEvent, SnapshotSender, SnapshotStream};
pub use sqlite::SqliteCache;
pub use store::{SyncState, SyncedStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cache::LocalCache;
    pub use crate::error::{Result, SyncError};
    pub use crate::memory::{MemoryCache, MemoryRemote};
    pub use crate::notify::{ErrorSink, FaultKind, LogSink};
    pub use crate::remote::{DocPath, Identity, RemoteStore};
    pub use crate::snapshot::Snapshot;
    pub use crate::sqlite::SqliteCache;
    pub use crate::store::{SyncState, SyncedStore};
}
