//! Notification Hub
//!
//! Explicit event-sink fan-out for request status changes. The hub is
//! owned by the composing application and passed into the workflow - no
//! process-wide listener registry. Sink failures are logged and swallowed;
//! they never propagate to the workflow caller.

use std::sync::Arc;

use tracing::{info, warn};

use crate::core_types::Username;

use super::status::RequestStatus;
use super::types::ContigTransferRequest;

/// A request status-change event
///
/// `previous` is None for creation (the prior status is unknown to any
/// observer); otherwise it is the status captured before the mutation.
#[derive(Debug, Clone)]
pub struct TransferEvent {
    pub actor: Username,
    pub request: ContigTransferRequest,
    pub previous: Option<RequestStatus>,
}

/// Receiver of transfer status-change events
pub trait EventSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &'static str;

    fn on_status_change(&self, event: &TransferEvent) -> anyhow::Result<()>;
}

/// Synchronous fan-out over registered sinks
#[derive(Default, Clone)]
pub struct NotificationHub {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Deliver `event` to every sink; a failing sink is logged and skipped.
    pub fn broadcast(&self, event: &TransferEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.on_status_change(event) {
                warn!(
                    sink = sink.name(),
                    request_id = event.request.id,
                    error = %e,
                    "Notification sink failed (event dropped for this sink)"
                );
            }
        }
    }
}

/// Sink that records status changes to the tracing log
pub struct LogSink;

impl EventSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn on_status_change(&self, event: &TransferEvent) -> anyhow::Result<()> {
        let previous = event
            .previous
            .map(|s| s.as_str())
            .unwrap_or("UNKNOWN");
        info!(
            request_id = event.request.id,
            contig_id = event.request.contig_id,
            actor = %event.actor,
            previous,
            status = %event.request.status,
            "Transfer request status changed"
        );
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::recording::RecordingSink;
    use super::*;

    fn event(status: RequestStatus, previous: Option<RequestStatus>) -> TransferEvent {
        TransferEvent {
            actor: "alice".into(),
            request: ContigTransferRequest {
                id: 1,
                contig_id: 7,
                old_project: 1,
                new_project: 2,
                requester: "alice".into(),
                requester_comment: None,
                reviewer: None,
                reviewer_comment: None,
                status,
                opened: Utc::now(),
                reviewed: None,
                closed: None,
            },
            previous,
        }
    }

    #[test]
    fn test_broadcast_reaches_all_sinks() {
        let a = Arc::new(RecordingSink::new());
        let b = Arc::new(RecordingSink::new());
        let mut hub = NotificationHub::new();
        hub.register(a.clone());
        hub.register(b.clone());

        hub.broadcast(&event(RequestStatus::Pending, None));
        assert_eq!(a.count(), 1);
        assert_eq!(b.count(), 1);
        assert_eq!(a.statuses(), vec![(None, RequestStatus::Pending)]);
    }

    #[test]
    fn test_sink_failure_does_not_stop_fanout() {
        let failing = Arc::new(RecordingSink::new());
        failing.set_fail(true);
        let healthy = Arc::new(RecordingSink::new());

        let mut hub = NotificationHub::new();
        hub.register(failing.clone());
        hub.register(healthy.clone());

        // Must not panic or abort delivery to the second sink
        hub.broadcast(&event(RequestStatus::Approved, Some(RequestStatus::Pending)));
        assert_eq!(failing.count(), 1);
        assert_eq!(healthy.count(), 1);
    }
}
