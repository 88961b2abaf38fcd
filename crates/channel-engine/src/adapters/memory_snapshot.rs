//! An in-memory [`SnapshotStore`] keyed by offset, ordered so
//! `latest_before` is a cheap range query.

use std::collections::BTreeMap;

use channel_types::EventOffset;
use parking_lot::RwLock;

use crate::ports::snapshot::{Snapshot, SnapshotStore, DEFAULT_SNAPSHOT_INTERVAL};

/// In-memory snapshot cache. Pruning here is a real eviction since
/// keeping it bounded costs nothing extra to implement.
pub struct InMemorySnapshotManager {
    interval: EventOffset,
    snapshots: RwLock<BTreeMap<EventOffset, Snapshot>>,
}

impl InMemorySnapshotManager {
    /// A snapshot cache with a custom interval.
    pub fn new(interval: EventOffset) -> Self {
        Self {
            interval,
            snapshots: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemorySnapshotManager {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_INTERVAL)
    }
}

impl SnapshotStore for InMemorySnapshotManager {
    fn create(&self, offset: EventOffset, timestamp_ms: u64, data: Vec<u8>) {
        let mut snapshots = self.snapshots.write();
        snapshots.insert(
            offset,
            Snapshot {
                offset,
                timestamp_ms,
                data,
            },
        );
    }

    fn get(&self, offset: EventOffset) -> Option<Snapshot> {
        self.snapshots.read().get(&offset).cloned()
    }

    fn latest_before(&self, offset: EventOffset) -> Option<Snapshot> {
        self.snapshots
            .read()
            .range(..offset)
            .next_back()
            .map(|(_, snapshot)| snapshot.clone())
    }

    fn interval(&self) -> EventOffset {
        self.interval
    }

    fn prune(&self, keep_most_recent: usize) {
        let mut snapshots = self.snapshots.write();
        while snapshots.len() > keep_most_recent {
            let Some(&oldest) = snapshots.keys().next() else {
                break;
            };
            snapshots.remove(&oldest);
        }
    }
}
