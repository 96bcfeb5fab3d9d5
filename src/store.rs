//! SyncedStore - a per-key value handle mirrored to the local cache and,
//! when an identity is connected, to a per-user remote document.
//!
//! Semantics:
//! - Local-first: writes land in memory and the cache before any remote
//!   round trip; reads never wait on the network.
//! - Remote-authoritative once connected: a differing remote snapshot
//!   replaces the in-memory value and the cache entry.
//! - Absence never clobbers: a missing remote document leaves local state
//!   untouched, so a value pending its first remote write survives login.
//! - Last write wins: concurrent writers are not merged; the remote
//!   backend's ordering decides between devices. Known limitation.

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::cache::LocalCache;
use crate::error::Result;
use crate::key::validate_key;
use crate::notify::{ErrorSink, FaultKind};
use crate::remote::{DocPath, Identity, RemoteStore};
use crate::snapshot::Snapshot;

/// Connection state of a store, per key.
///
/// The store is long-lived and cycles between `Disconnected` and `Synced`
/// as the user logs in and out; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No identity; the store operates purely from the local cache.
    Disconnected,
    /// Identity present, first remote snapshot not yet delivered.
    Connecting,
    /// Subscription live; the mirrored value reflects the latest known
    /// remote state or its confirmed absence.
    Synced,
}

/// State shared with the subscription driver task.
struct Shared<T> {
    key: String,
    value: RwLock<T>,
    state: RwLock<SyncState>,
    revision: watch::Sender<u64>,
    /// Revision of the value last written to the cache. Guards cache writes
    /// so a slow persist of an older swap can never land after a newer one.
    persisted: tokio::sync::Mutex<u64>,
    cache: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteStore>,
    sink: Arc<dyn ErrorSink>,
}

/// Active remote subscription. Cancellation is synchronous and idempotent;
/// aborting the driver task drops the snapshot stream, which releases the
/// transport resource.
struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A read/write handle over one named value, transparently synchronized
/// across the local cache and an optional remote document.
///
/// Construct one per store key with [`SyncedStore::open`], passing the
/// collaborators explicitly; there is no ambient global state.
pub struct SyncedStore<T> {
    shared: Arc<Shared<T>>,
    identity: Mutex<Option<Identity>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<T> SyncedStore<T>
where
    T: Serialize + DeserializeOwned + PartialEq + Clone + Send + Sync + 'static,
{
    /// Open a store for `key`, seeding the in-memory value from the cache.
    ///
    /// A cache hit is deserialized and adopted; a miss, a cache fault, or an
    /// undecodable cached payload all fall back to `initial`, which is NOT
    /// written back to the cache. Only a malformed key fails.
    pub async fn open(
        key: impl Into<String>,
        initial: T,
        cache: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteStore>,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;

        let value = match cache.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    warn!(key = %key, "cached payload undecodable, using initial value: {e}");
                    initial
                }
            },
            Ok(None) => initial,
            Err(e) => {
                warn!(key = %key, "cache read failed, using initial value: {e}");
                initial
            }
        };

        let (revision, _) = watch::channel(0);

        Ok(Self {
            shared: Arc::new(Shared {
                key,
                value: RwLock::new(value),
                state: RwLock::new(SyncState::Disconnected),
                revision,
                persisted: tokio::sync::Mutex::new(0),
                cache,
                remote,
                sink,
            }),
            identity: Mutex::new(None),
            subscription: Mutex::new(None),
        })
    }

    /// The store key.
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// Current connection state.
    pub fn state(&self) -> SyncState {
        *self.shared.state.read()
    }

    /// Identity currently connected, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.identity.lock().clone()
    }

    /// Clone of the current in-memory value. Never touches cache or network,
    /// so a write is visible here before its remote round trip completes.
    pub fn get(&self) -> T {
        self.shared.value.read().clone()
    }

    /// Monotonic count of in-memory value changes. Suppressed remote echoes
    /// do not bump it.
    pub fn revision(&self) -> u64 {
        *self.shared.revision.borrow()
    }

    /// Watch channel that ticks on every in-memory value change. A reactive
    /// UI layer awaits this to re-render.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Replace the value.
    ///
    /// The in-memory swap and cache write complete before this returns; the
    /// remote upsert (when an identity is connected) is fire-and-forget, and
    /// its failure is reported to the sink without rolling back the local
    /// write. Cache faults are logged and leave in-memory state correct.
    pub async fn set(&self, value: T) {
        self.update(move |_| value).await;
    }

    /// Apply a pure function to the current value.
    ///
    /// The updater runs under the value lock against the value current at
    /// that moment, so rapid sequential updates each see their predecessor's
    /// result, never a stale snapshot. Persistence follows [`set`] semantics.
    ///
    /// [`set`]: SyncedStore::set
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        // The revision is stamped inside the value lock so swap order and
        // stamp order agree across concurrent writers.
        let (new_value, revision) = {
            let mut guard = self.shared.value.write();
            let next = f(&*guard);
            *guard = next.clone();
            let mut revision = 0;
            self.shared.revision.send_modify(|r| {
                *r += 1;
                revision = *r;
            });
            (next, revision)
        };

        self.shared.persist(revision, &new_value).await;
        self.spawn_upsert(new_value);
    }

    /// Connect or disconnect the remote mirror.
    ///
    /// Any prior subscription is released first (synchronously, idempotent),
    /// so no snapshot of a previous identity or key is applied once the new
    /// subscription is established. With `None`, the store returns to
    /// local-only operation, retaining the last known value.
    pub fn connect(&self, identity: Option<Identity>) {
        // Tear down the previous subscription before anything else.
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
        }

        let Some(identity) = identity else {
            *self.identity.lock() = None;
            *self.shared.state.write() = SyncState::Disconnected;
            debug!(key = %self.shared.key, "disconnected");
            return;
        };

        let path = match DocPath::new(&identity, &self.shared.key) {
            Ok(path) => path,
            // Key was validated at open; an identity that breaks the path is
            // a subscription fault, not a crash.
            Err(e) => {
                self.shared
                    .sink
                    .report(FaultKind::RemoteSubscription, &e.to_string());
                return;
            }
        };

        *self.identity.lock() = Some(identity);
        *self.shared.state.write() = SyncState::Connecting;

        let stream = match self.shared.remote.subscribe(&path) {
            Ok(stream) => stream,
            Err(e) => {
                // Store stays usable from the cache; dual-write still applies
                // on the next local write.
                self.shared
                    .sink
                    .report(FaultKind::RemoteSubscription, &e.to_string());
                return;
            }
        };

        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            let mut stream = stream;
            let mut first = true;
            while let Some(snapshot) = stream.next().await {
                if first {
                    // First delivery, document or confirmed absence.
                    *shared.state.write() = SyncState::Synced;
                    first = false;
                }
                match snapshot {
                    // Never overwrite local state with absence: a value
                    // pending its first remote write must survive.
                    Snapshot::Missing => {}
                    Snapshot::Document(value) => shared.apply_remote(value).await,
                }
            }
        });

        *self.subscription.lock() = Some(Subscription { task });
        debug!(key = %self.shared.key, path = %path, "subscribed");
    }

    /// Shorthand for `connect(None)`.
    pub fn disconnect(&self) {
        self.connect(None);
    }

    /// Issue the fire-and-forget remote upsert for a locally written value.
    fn spawn_upsert(&self, value: T) {
        let Some(identity) = self.identity.lock().clone() else {
            return;
        };

        let path = match DocPath::new(&identity, &self.shared.key) {
            Ok(path) => path,
            Err(e) => {
                self.shared
                    .sink
                    .report(FaultKind::RemoteWrite, &e.to_string());
                return;
            }
        };

        let payload = match serde_json::to_value(&value) {
            Ok(payload) => payload,
            Err(e) => {
                self.shared
                    .sink
                    .report(FaultKind::RemoteWrite, &format!("unserializable value: {e}"));
                return;
            }
        };

        let remote = Arc::clone(&self.shared.remote);
        let sink = Arc::clone(&self.shared.sink);
        tokio::spawn(async move {
            if let Err(e) = remote.upsert(&path, payload).await {
                sink.report(FaultKind::RemoteWrite, &e.to_string());
            }
        });
    }
}

impl<T> Shared<T>
where
    T: Serialize + DeserializeOwned + PartialEq + Clone + Send + Sync + 'static,
{
    /// Mirror a value to the local cache. Faults are logged; in-memory state
    /// is already correct for the session.
    ///
    /// Cache writes are serialized through the persisted-revision gate, and
    /// a write whose swap has already been superseded by a newer persisted
    /// one is dropped, so the cache never regresses behind memory.
    async fn persist(&self, revision: u64, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %self.key, "cache serialization failed: {e}");
                return;
            }
        };

        let mut persisted = self.persisted.lock().await;
        if revision <= *persisted {
            return;
        }
        match self.cache.set(&self.key, bytes).await {
            Ok(()) => *persisted = revision,
            Err(e) => warn!(key = %self.key, "cache write failed: {e}"),
        }
    }

    /// Reconcile a remote document snapshot into local state.
    async fn apply_remote(&self, value: serde_json::Value) {
        let decoded: T = match serde_json::from_value(value) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.sink.report(
                    FaultKind::RemoteSubscription,
                    &format!("undecodable snapshot for {}: {e}", self.key),
                );
                return;
            }
        };

        let revision = {
            let mut guard = self.value.write();
            // A stale echo of an already-applied value, or of a newer local
            // write, must not rewrite the cache or wake watchers.
            if *guard == decoded {
                return;
            }
            *guard = decoded.clone();
            let mut revision = 0;
            self.revision.send_modify(|r| {
                *r += 1;
                revision = *r;
            });
            revision
        };

        self.persist(revision, &decoded).await;
    }
}
