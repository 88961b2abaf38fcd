//! The snapshot manager contract: an offset-keyed cache of
//! opaque serialized state blobs, plus interval policy.

use channel_types::EventOffset;

/// Default interval between recommended snapshots, in offsets.
pub const DEFAULT_SNAPSHOT_INTERVAL: EventOffset = 1000;

/// A cached, opaque world state at a given log offset. Never
/// authoritative: absence of any snapshot is always legal and only costs
/// replay time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// The offset this snapshot was taken after (i.e. it reflects all
    /// events with offset `< self.offset`).
    pub offset: EventOffset,
    /// Wall-clock time the snapshot was created, in milliseconds since
    /// the Unix epoch.
    pub timestamp_ms: u64,
    /// Opaque serialized state. The manager never inspects this; the
    /// reconstructor owns serialization and deserialization.
    pub data: Vec<u8>,
}

/// Maps log offsets to serialized state blobs. Oblivious to
/// what `data` encodes.
pub trait SnapshotStore: Send + Sync {
    /// Store `data` for `offset`, replacing any existing entry.
    fn create(&self, offset: EventOffset, timestamp_ms: u64, data: Vec<u8>);

    /// Exact lookup for a snapshot at `offset`.
    fn get(&self, offset: EventOffset) -> Option<Snapshot>;

    /// The snapshot with the greatest offset strictly less than
    /// `offset`, if any.
    fn latest_before(&self, offset: EventOffset) -> Option<Snapshot>;

    /// The configured interval between recommended snapshots.
    fn interval(&self) -> EventOffset;

    /// Whether `offset` is a recommended snapshot point: `offset > 0 ∧
    /// offset mod interval == 0`.
    fn should_snapshot(&self, offset: EventOffset) -> bool {
        let interval = self.interval();
        interval > 0 && offset > 0 && offset % interval == 0
    }

    /// The next recommended snapshot offset strictly greater than
    /// `current`.
    fn next_offset(&self, current: EventOffset) -> EventOffset {
        let interval = self.interval().max(1);
        (current / interval + 1) * interval
    }

    /// Evict old snapshots per a "keep at most N" policy. A no-op is a
    /// legal implementation.
    fn prune(&self, keep_most_recent: usize);
}
