//! The event store contract: an ordered, append-only log with
//! stable references and synchronous fan-out notification.

use std::sync::Arc;

use channel_types::{EventOffset, StoreError};

use crate::domain::event::Event;

/// Identifies a registered subscriber, returned by
/// [`EventStore::subscribe`] for future reference. Unused beyond identity
/// today; kept so an adapter can add `unsubscribe` without a breaking
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A subscriber callback: invoked with the newly appended event and the
/// offset it was assigned, synchronously inside `append`'s critical
/// section. Must be non-blocking and must not call back into `append`.
pub type SubscriberFn = Box<dyn Fn(&Event, EventOffset) + Send + Sync>;

/// An ordered, append-only, thread-safe log of [`Event`].
pub trait EventStore: Send + Sync {
    /// Atomically assign the next offset, store `event` there, and
    /// synchronously notify every registered subscriber before
    /// returning. The returned offset equals the log length before this
    /// call.
    fn append(&self, event: Event) -> Result<EventOffset, StoreError>;

    /// Fetch the event at `offset`. The returned handle remains valid
    /// for the store's lifetime regardless of subsequent appends.
    fn read_at(&self, offset: EventOffset) -> Result<Arc<Event>, StoreError>;

    /// Fetch a copy of the events in `[start, end)`.
    fn read_range(&self, start: EventOffset, end: EventOffset) -> Result<Vec<Arc<Event>>, StoreError>;

    /// Register a fan-out callback. Callbacks registered before an
    /// append are guaranteed to observe it.
    fn subscribe(&self, callback: SubscriberFn) -> SubscriptionId;

    /// Current log length. Must be a cheap, lock-free read.
    fn len(&self) -> EventOffset;

    /// Shorthand for `read_range(0, len())`.
    fn read_all(&self) -> Vec<Arc<Event>> {
        let len = self.len();
        if len == 0 {
            Vec::new()
        } else {
            self.read_range(0, len).unwrap_or_default()
        }
    }

    /// Whether the log has no events yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
