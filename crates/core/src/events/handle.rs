use chrono::Utc;
use tokio::sync::mpsc;

use super::{EventEnvelope, MonitorEvent};

/// Handle for emitting monitor events
///
/// Cheaply cloneable. Events travel over a bounded channel to the
/// `EventDispatcher`; a full or closed channel is logged and never fails
/// the caller.
#[derive(Clone)]
pub struct EventHandle {
    tx: mpsc::Sender<EventEnvelope>,
}

impl EventHandle {
    /// Create a new event handle from a channel sender
    pub fn new(tx: mpsc::Sender<EventEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an event, waiting for channel capacity
    ///
    /// Blocks while the dispatcher lags; pipeline stages use [`try_emit`](Self::try_emit).
    pub async fn emit(&self, event: MonitorEvent) {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if let Err(e) = self.tx.send(envelope).await {
            tracing::error!("Failed to emit monitor event: {}", e);
        }
    }

    /// Try to emit an event without waiting
    ///
    /// Returns true if the event was queued.
    pub fn try_emit(&self, event: MonitorEvent) -> bool {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to emit monitor event: {}", e);
                false
            }
        }
    }
}
