//! Event types for the zgal event system
//!
//! Provides the session event definitions and the broadcast EventBus.

mod session_types;

pub use session_types::{ProgressData, RevealCounts};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Gallery session events
///
/// Events are broadcast via EventBus and serialize with a `type` tag so a
/// host UI can consume them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GalleryEvent {
    /// Session started fetching from its source collections
    SessionStarted {
        session_id: Uuid,
        /// Source collection ids in crawl order
        sources: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A page of new records was retained
    BatchReceived {
        session_id: Uuid,
        collection: String,
        /// Records in this batch (after de-duplication)
        records: usize,
        /// Records retained so far across all collections
        total_loaded: usize,
        timestamp: DateTime<Utc>,
    },

    /// Pagination of one collection stopped early
    ///
    /// Records already retained stay; the collection is not retried.
    CollectionFailed {
        session_id: Uuid,
        collection: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Loading progress changed
    ProgressUpdated {
        session_id: Uuid,
        progress: ProgressData,
        timestamp: DateTime<Utc>,
    },

    /// Every collection is exhausted or failed
    FetchCompleted {
        session_id: Uuid,
        total_loaded: usize,
        /// True when at least one collection ended early
        partial: bool,
        timestamp: DateTime<Utc>,
    },

    /// A render pass finished revealing its items
    ItemsRevealed {
        session_id: Uuid,
        /// Render generation the items belong to
        generation: u64,
        counts: RevealCounts,
        timestamp: DateTime<Utc>,
    },

    /// Visible view (filter × page) was rebuilt
    ViewChanged {
        session_id: Uuid,
        /// Active filter key, `"all"` for no filter
        filter: String,
        page: usize,
        total_pages: usize,
        /// Items on the current page
        visible: usize,
        timestamp: DateTime<Utc>,
    },
}

impl GalleryEvent {
    /// Event type name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            GalleryEvent::SessionStarted { .. } => "SessionStarted",
            GalleryEvent::BatchReceived { .. } => "BatchReceived",
            GalleryEvent::CollectionFailed { .. } => "CollectionFailed",
            GalleryEvent::ProgressUpdated { .. } => "ProgressUpdated",
            GalleryEvent::FetchCompleted { .. } => "FetchCompleted",
            GalleryEvent::ItemsRevealed { .. } => "ItemsRevealed",
            GalleryEvent::ViewChanged { .. } => "ViewChanged",
        }
    }

    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            GalleryEvent::SessionStarted { session_id, .. }
            | GalleryEvent::BatchReceived { session_id, .. }
            | GalleryEvent::CollectionFailed { session_id, .. }
            | GalleryEvent::ProgressUpdated { session_id, .. }
            | GalleryEvent::FetchCompleted { session_id, .. }
            | GalleryEvent::ItemsRevealed { session_id, .. }
            | GalleryEvent::ViewChanged { session_id, .. } => *session_id,
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block the session)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use zgal_common::events::{EventBus, GalleryEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(GalleryEvent::FetchCompleted {
///     session_id: uuid::Uuid::new_v4(),
///     total_loaded: 42,
///     partial: false,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "FetchCompleted");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GalleryEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before slow subscribers
    /// start lagging.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: GalleryEvent,
    ) -> Result<usize, broadcast::error::SendError<GalleryEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GalleryEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(total_loaded: usize) -> GalleryEvent {
        GalleryEvent::FetchCompleted {
            session_id: Uuid::new_v4(),
            total_loaded,
            partial: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_emit_without_subscribers_is_err() {
        let bus = EventBus::new(10);
        assert!(bus.emit(completed(1)).is_err());
        // lossy variant must not panic either
        bus.emit_lossy(completed(1));
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.emit(completed(3)).unwrap(), 2);
        assert_eq!(rx1.try_recv().unwrap().event_type(), "FetchCompleted");
        assert_eq!(rx2.try_recv().unwrap().event_type(), "FetchCompleted");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let session_id = Uuid::new_v4();
        let event = GalleryEvent::ViewChanged {
            session_id,
            filter: "silvopastoral".to_string(),
            page: 2,
            total_pages: 3,
            visible: 24,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ViewChanged");
        assert_eq!(json["filter"], "silvopastoral");
        assert_eq!(event.session_id(), session_id);
    }

    #[test]
    fn test_reveal_counts_total() {
        let counts = RevealCounts {
            loaded: 3,
            failed: 1,
            timed_out: 2,
        };
        assert_eq!(counts.total(), 6);
    }
}
