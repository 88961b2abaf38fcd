//! Ports: the interfaces the domain needs satisfied by the outside world.
//! Adapters in [`crate::adapters`] implement these traits; the domain
//! depends only on the trait, never the concrete adapter.

pub mod snapshot;
pub mod store;
pub mod validation;

pub use snapshot::{Snapshot, SnapshotStore};
pub use store::{EventStore, SubscriptionId};
pub use validation::ValidationContext;
