use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use pkg_constants::state::EVENT_BROADCAST_CAPACITY;

/// Type of event in the watch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Put,
    Delete,
}

/// A single state change, numbered in commit order.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub seq: u64,
    pub event_type: EventType,
    pub key: String,
}

/// Fan-out of store mutations to live subscribers.
///
/// Subscribers only receive events emitted after they subscribed.
#[derive(Clone)]
pub struct EventLog {
    seq: Arc<AtomicU64>,
    sender: broadcast::Sender<WatchEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BROADCAST_CAPACITY);
        Self {
            seq: Arc::new(AtomicU64::new(0)),
            sender,
        }
    }

    /// Record a new event. Called by StateStore after every put/delete.
    pub fn emit(&self, event_type: EventType, key: &str) {
        let event = WatchEvent {
            seq: self.seq.fetch_add(1, Ordering::SeqCst) + 1,
            event_type,
            key: key.to_string(),
        };
        // No receivers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.sender.subscribe()
    }
}
