//! Error-notification sink - where degraded-mode faults are reported.
//!
//! The store never fails its caller for a recoverable fault; it reports the
//! fault here and keeps serving cache-backed state. Reports are
//! fire-and-forget and never awaited.

use parking_lot::Mutex;
use tracing::warn;

/// Classification of a reported fault. Cache faults stay in the log; only
/// remote faults reach the sink, since those are the ones a user can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    RemoteSubscription,
    RemoteWrite,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::RemoteSubscription => "remote-subscription",
            FaultKind::RemoteWrite => "remote-write",
        }
    }
}

/// Sink for fault reports. The hosting application typically surfaces
/// these to the user (toast, status bar).
pub trait ErrorSink: Send + Sync {
    fn report(&self, kind: FaultKind, message: &str);
}

/// Default sink: structured log only.
#[derive(Debug, Default)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&self, kind: FaultKind, message: &str) {
        warn!(kind = kind.as_str(), "{message}");
    }
}

/// Test sink capturing every report.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<(FaultKind, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports received so far.
    pub fn reports(&self) -> Vec<(FaultKind, String)> {
        self.reports.lock().clone()
    }

    /// Number of reports of a given kind.
    pub fn count(&self, kind: FaultKind) -> usize {
        self.reports.lock().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, kind: FaultKind, message: &str) {
        self.reports.lock().push((kind, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_captures_reports() {
        let sink = RecordingSink::new();
        sink.report(FaultKind::RemoteWrite, "upsert denied");
        sink.report(FaultKind::RemoteSubscription, "listener dropped");

        let reports = sink.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], (FaultKind::RemoteWrite, "upsert denied".to_string()));
        assert_eq!(sink.count(FaultKind::RemoteWrite), 1);
        assert_eq!(sink.count(FaultKind::RemoteSubscription), 1);
    }

    #[test]
    fn test_fault_kind_labels() {
        assert_eq!(FaultKind::RemoteSubscription.as_str(), "remote-subscription");
        assert_eq!(FaultKind::RemoteWrite.as_str(), "remote-write");
    }
}
