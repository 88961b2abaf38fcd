//! An in-memory [`EventStore`] backed by a segmented list of 1024-event
//! chunks.
//!
//! Each stored event is held behind an `Arc`, so the returned handles are
//! themselves pointer-stable independent of the segmenting; the
//! segmenting keeps a single segment's reallocation (rare, append-only
//! growth within a segment) from ever touching previously issued
//! segments. `parking_lot::RwLock` guards the structural mutation so
//! concurrent readers never block each other, only a concurrent writer;
//! an `AtomicU64` backs the lock-free `len()`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use channel_types::{EventOffset, StoreError};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::domain::event::Event;
use crate::ports::store::{EventStore, SubscriberFn, SubscriptionId};

const SEGMENT_SIZE: usize = 1024;

struct Inner {
    segments: Vec<Vec<Arc<Event>>>,
    count: u64,
    subscribers: Vec<(SubscriptionId, SubscriberFn)>,
    next_subscription_id: u64,
}

/// Thread-safe, append-only, in-memory event log.
pub struct InMemoryEventStore {
    len: AtomicU64,
    inner: RwLock<Inner>,
}

impl InMemoryEventStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            len: AtomicU64::new(0),
            inner: RwLock::new(Inner {
                segments: Vec::new(),
                count: 0,
                subscribers: Vec::new(),
                next_subscription_id: 0,
            }),
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn locate(offset: EventOffset) -> (usize, usize) {
    let offset = offset as usize;
    (offset / SEGMENT_SIZE, offset % SEGMENT_SIZE)
}

impl EventStore for InMemoryEventStore {
    fn append(&self, event: Event) -> Result<EventOffset, StoreError> {
        let mut inner = self.inner.write();
        let offset = inner.count;
        let (segment_idx, _) = locate(offset);
        if segment_idx == inner.segments.len() {
            inner.segments.push(Vec::with_capacity(SEGMENT_SIZE));
        }

        let stored = Arc::new(event);
        inner.segments[segment_idx].push(stored.clone());
        inner.count += 1;
        // Release: readers that observe len() >= offset+1 via Acquire
        // are guaranteed to see this segment's push.
        self.len.store(inner.count, Ordering::Release);

        // Subscriber fan-out runs inside the critical section:
        // callbacks for this append complete before any other thread can
        // observe len() > offset. A panicking subscriber is isolated so
        // it cannot prevent the rest from running or poison the store.
        for (id, subscriber) in &inner.subscribers {
            let outcome = catch_unwind(AssertUnwindSafe(|| subscriber(&stored, offset)));
            if outcome.is_err() {
                warn!(subscription = id.0, offset, "event store subscriber panicked");
            }
        }

        debug!(offset, kind = stored.kind_name(), "event appended");
        Ok(offset)
    }

    fn read_at(&self, offset: EventOffset) -> Result<Arc<Event>, StoreError> {
        let inner = self.inner.read();
        if offset >= inner.count {
            return Err(StoreError::OffsetOutOfBounds(offset));
        }
        let (segment_idx, within) = locate(offset);
        Ok(inner.segments[segment_idx][within].clone())
    }

    fn read_range(&self, start: EventOffset, end: EventOffset) -> Result<Vec<Arc<Event>>, StoreError> {
        let inner = self.inner.read();
        if start >= end || end > inner.count {
            return Err(StoreError::InvalidRange { start, end });
        }
        let mut out = Vec::with_capacity((end - start) as usize);
        for offset in start..end {
            let (segment_idx, within) = locate(offset);
            out.push(inner.segments[segment_idx][within].clone());
        }
        Ok(out)
    }

    fn subscribe(&self, callback: SubscriberFn) -> SubscriptionId {
        let mut inner = self.inner.write();
        let id = SubscriptionId(inner.next_subscription_id);
        inner.next_subscription_id += 1;
        inner.subscribers.push((id, callback));
        id
    }

    fn len(&self) -> EventOffset {
        self.len.load(Ordering::Acquire)
    }
}
