//! Snapshot streams - live notification plumbing for remote documents.
//!
//! A subscription yields the document's current state as its first item
//! (including confirmed absence) and then one snapshot per remote change,
//! in the order the backend emits them. Dropping the stream releases the
//! underlying broadcast receiver; no unsubscribe call is needed.

use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::Stream;

/// One observation of a remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Snapshot {
    /// The document does not exist at the observed path.
    Missing,
    /// The document exists; carries the unwrapped `value` field of its body.
    Document(serde_json::Value),
}

impl Snapshot {
    /// The document value, if the document exists.
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Snapshot::Missing => None,
            Snapshot::Document(value) => Some(value),
        }
    }
}

/// An event broadcast to all subscribers of a remote backend.
#[derive(Debug, Clone)]
pub struct SnapshotEvent {
    /// The document path that changed.
    pub path: String,
    /// The document state after the change.
    pub snapshot: Snapshot,
}

/// A stream of snapshots for a single document path.
pub struct SnapshotStream {
    initial: Option<Snapshot>,
    receiver: broadcast::Receiver<SnapshotEvent>,
    path: String,
}

impl SnapshotStream {
    /// Create a stream that yields `initial` first, then matching broadcast
    /// events.
    pub fn new(
        initial: Snapshot,
        receiver: broadcast::Receiver<SnapshotEvent>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            initial: Some(initial),
            receiver,
            path: path.into(),
        }
    }

    /// The document path this stream observes.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Stream for SnapshotStream {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(snapshot) = self.initial.take() {
            return Poll::Ready(Some(snapshot));
        }

        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if event.path == self.path {
                        return Poll::Ready(Some(event.snapshot));
                    }
                    // Event is for another path, continue polling
                }
                Err(broadcast::error::TryRecvError::Empty) => {
                    // Register waker and return pending
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Poll::Ready(None);
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    // Skip lagged events; the next snapshot supersedes them
                    continue;
                }
            }
        }
    }
}

/// Handle for publishing snapshots to subscribers.
#[derive(Clone)]
pub struct SnapshotSender {
    sender: broadcast::Sender<SnapshotEvent>,
}

impl SnapshotSender {
    /// Create a new sender with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a snapshot for a path to all subscribers.
    pub fn send(&self, path: impl Into<String>, snapshot: Snapshot) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(SnapshotEvent {
            path: path.into(),
            snapshot,
        });
    }

    /// Subscribe to a path, delivering `initial` as the first item.
    pub fn subscribe(&self, path: impl Into<String>, initial: Snapshot) -> SnapshotStream {
        SnapshotStream::new(initial, self.sender.subscribe(), path)
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SnapshotSender {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[test]
    fn test_snapshot_value() {
        assert!(Snapshot::Missing.value().is_none());
        let doc = Snapshot::Document(serde_json::json!([1, 2, 3]));
        assert_eq!(doc.value(), Some(&serde_json::json!([1, 2, 3])));
    }

    #[tokio::test]
    async fn test_initial_snapshot_delivered_first() {
        let sender = SnapshotSender::new(16);
        let mut stream = sender.subscribe(
            "users/u1/data/primal-ideas",
            Snapshot::Document(serde_json::json!(["initial"])),
        );

        let first = stream.next().await.unwrap();
        assert_eq!(first, Snapshot::Document(serde_json::json!(["initial"])));
    }

    #[tokio::test]
    async fn test_path_filtering() {
        let sender = SnapshotSender::new(16);
        let mut stream = sender.subscribe("users/u1/data/primal-events", Snapshot::Missing);

        // Consume the initial snapshot
        assert_eq!(stream.next().await.unwrap(), Snapshot::Missing);

        sender.send(
            "users/u2/data/primal-events",
            Snapshot::Document(serde_json::json!("other user")),
        );
        sender.send(
            "users/u1/data/primal-events",
            Snapshot::Document(serde_json::json!("mine")),
        );

        let next = stream.next().await.unwrap();
        assert_eq!(next, Snapshot::Document(serde_json::json!("mine")));
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_dropped() {
        let sender = SnapshotSender::new(16);
        let mut stream = sender.subscribe("users/u1/data/primal-work", Snapshot::Missing);
        assert_eq!(stream.next().await.unwrap(), Snapshot::Missing);

        drop(sender);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_receiver_count() {
        let sender = SnapshotSender::new(16);
        assert_eq!(sender.receiver_count(), 0);
        let _a = sender.subscribe("p", Snapshot::Missing);
        let _b = sender.subscribe("p", Snapshot::Missing);
        assert_eq!(sender.receiver_count(), 2);
    }
}
