//! State reconstruction: deterministic left-folds over the
//! event log yielding per-objective and per-channel state, accelerated by
//! snapshots.
//!
//! Snapshots are offset-keyed, but acceleration is needed per entity, so
//! each snapshot captures the *whole world*: a blob containing every
//! known objective's and channel's state as of an offset. Per-entity
//! lookup reads from the world blob closest at or before the target
//! offset and replays only the remaining events, folding the tagged-union
//! event stream into a keyed state map.

use std::collections::HashMap;
use std::sync::Arc;

use channel_types::{Address, Bytes32, EventOffset, ReconstructError};
use serde::{Deserialize, Serialize};

use crate::domain::event::{Event, ObjectiveType};
use crate::ports::snapshot::SnapshotStore;
use crate::ports::store::EventStore;

/// Lifecycle status of an objective, derived purely from its event
/// history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveStatus {
    /// `objective-created` has been observed; nothing else yet.
    Created,
    /// `objective-approved` has been observed.
    Approved,
    /// `objective-rejected` has been observed. Terminal.
    Rejected,
    /// At least one `objective-cranked` has been observed.
    Cranked,
    /// `objective-completed` has been observed. Terminal.
    Completed,
}

/// Derived state of a single objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveState {
    /// The objective's id.
    pub id: Bytes32,
    /// Which protocol this objective pursues.
    pub objective_type: ObjectiveType,
    /// The channel this objective concerns.
    pub channel_id: Bytes32,
    /// Current lifecycle status.
    pub status: ObjectiveStatus,
    /// Total number of events folded into this state.
    pub event_count: u64,
    /// Timestamp of the creating event.
    pub created_at: u64,
    /// Timestamp of the completing event, if completed.
    pub completed_at: Option<u64>,
}

impl ObjectiveState {
    fn apply(mut self, event: &Event) -> Self {
        self.event_count += 1;
        match event {
            Event::ObjectiveApproved(_) => self.status = ObjectiveStatus::Approved,
            Event::ObjectiveRejected(_) => self.status = ObjectiveStatus::Rejected,
            Event::ObjectiveCranked(_) => self.status = ObjectiveStatus::Cranked,
            Event::ObjectiveCompleted(p) => {
                self.status = ObjectiveStatus::Completed;
                self.completed_at = Some(p.timestamp_ms);
            }
            _ => {}
        }
        self
    }
}

/// Lifecycle status of a channel, derived purely from its event history
///.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    /// `channel-created` has been observed; nothing else yet.
    Created,
    /// At least one signed/received state has been observed.
    Open,
    /// `channel-finalized` has been observed. Terminal.
    Finalized,
}

/// Derived state of a single channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    /// The channel's id.
    pub id: Bytes32,
    /// The channel's participants, fixed at creation.
    pub participants: Vec<Address>,
    /// Current lifecycle status.
    pub status: ChannelStatus,
    /// Highest turn number seen in a signed or received state.
    pub latest_turn_num: u64,
    /// Highest turn number with recorded sufficient support.
    pub latest_supported_turn: u64,
    /// Total number of events folded into this state.
    pub event_count: u64,
    /// Timestamp of the creating event.
    pub created_at: u64,
    /// Timestamp of the finalizing event, if finalized.
    pub finalized_at: Option<u64>,
}

impl ChannelState {
    fn apply(mut self, event: &Event) -> Self {
        self.event_count += 1;
        match event {
            Event::StateSigned(p) => {
                self.latest_turn_num = self.latest_turn_num.max(p.turn_num);
                if self.status == ChannelStatus::Created {
                    self.status = ChannelStatus::Open;
                }
            }
            Event::StateReceived(p) => {
                self.latest_turn_num = self.latest_turn_num.max(p.turn_num);
                if self.status == ChannelStatus::Created {
                    self.status = ChannelStatus::Open;
                }
            }
            Event::StateSupportedUpdated(p) => {
                self.latest_supported_turn = self.latest_supported_turn.max(p.supported_turn);
            }
            Event::ChannelFinalized(p) => {
                self.status = ChannelStatus::Finalized;
                self.finalized_at = Some(p.timestamp_ms);
            }
            _ => {}
        }
        self
    }
}

/// The aggregate "world" blob a snapshot stores: every objective and
/// channel known as of the snapshot's offset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorldState {
    objectives: HashMap<Bytes32, ObjectiveState>,
    channels: HashMap<Bytes32, ChannelState>,
}

/// Fold a single event into the world state. The first event mentioning
/// any given id must be that entity's creation event, or folding fails
/// with `InvalidFirstEvent`.
fn apply_event(mut world: WorldState, event: &Event) -> Result<WorldState, ReconstructError> {
    match event {
        Event::ObjectiveCreated(p) => {
            world.objectives.insert(
                p.objective_id,
                ObjectiveState {
                    id: p.objective_id,
                    objective_type: p.objective_type,
                    channel_id: p.channel_id,
                    status: ObjectiveStatus::Created,
                    event_count: 1,
                    created_at: p.timestamp_ms,
                    completed_at: None,
                },
            );
        }
        _ => {
            if let Some(oid) = event.objective_id() {
                let state = world
                    .objectives
                    .remove(&oid)
                    .ok_or(ReconstructError::InvalidFirstEvent(oid))?;
                world.objectives.insert(oid, state.apply(event));
            }
        }
    }

    match event {
        Event::ChannelCreated(p) => {
            world.channels.insert(
                p.channel_id,
                ChannelState {
                    id: p.channel_id,
                    participants: p.participants.clone(),
                    status: ChannelStatus::Created,
                    latest_turn_num: 0,
                    latest_supported_turn: 0,
                    event_count: 1,
                    created_at: p.timestamp_ms,
                    finalized_at: None,
                },
            );
        }
        _ => {
            if let Some(cid) = event.channel_id() {
                let state = world
                    .channels
                    .remove(&cid)
                    .ok_or(ReconstructError::InvalidFirstEvent(cid))?;
                world.channels.insert(cid, state.apply(event));
            }
        }
    }

    Ok(world)
}

/// Folds the event log into objective/channel state, using the snapshot
/// store to skip replaying events that already happened before a cached
/// offset.
pub struct StateReconstructor {
    store: Arc<dyn EventStore>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl StateReconstructor {
    /// Build a reconstructor over a store and its snapshot cache.
    pub fn new(store: Arc<dyn EventStore>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { store, snapshots }
    }

    fn world_at(&self, upto: EventOffset) -> Result<WorldState, ReconstructError> {
        let (start, mut world) = match self.snapshots.latest_before(upto.saturating_add(1)) {
            Some(snapshot) => {
                let world: WorldState = bincode::deserialize(&snapshot.data)
                    .expect("snapshot blobs are only ever produced by this reconstructor");
                (snapshot.offset, world)
            }
            None => (0, WorldState::default()),
        };

        if start < upto {
            let events = self
                .store
                .read_range(start, upto)
                .expect("start < upto and upto <= store.len() by construction");
            for event in &events {
                world = apply_event(world, event)?;
            }
        }

        Ok(world)
    }

    /// Fold the log into the current state of objective `id`.
    pub fn reconstruct_objective(&self, id: Bytes32) -> Result<ObjectiveState, ReconstructError> {
        let world = self.world_at(self.store.len())?;
        world
            .objectives
            .get(&id)
            .cloned()
            .ok_or(ReconstructError::NotFound(id))
    }

    /// Fold the log into the current state of channel `id`.
    pub fn reconstruct_channel(&self, id: Bytes32) -> Result<ChannelState, ReconstructError> {
        let world = self.world_at(self.store.len())?;
        world
            .channels
            .get(&id)
            .cloned()
            .ok_or(ReconstructError::NotFound(id))
    }

    /// If the log is currently at a recommended snapshot offset, fold
    /// the whole world and hand it to the snapshot store. A no-op
    /// otherwise. Returns whether a snapshot was taken.
    pub fn snapshot_if_due(&self, timestamp_ms: u64) -> Result<bool, ReconstructError> {
        let offset = self.store.len();
        if !self.snapshots.should_snapshot(offset) {
            return Ok(false);
        }
        let world = self.world_at(offset)?;
        let data = bincode::serialize(&world).expect("world state is always serializable");
        self.snapshots.create(offset, timestamp_ms, data);
        Ok(true)
    }
}
