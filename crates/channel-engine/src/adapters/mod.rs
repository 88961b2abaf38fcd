//! Adapters: concrete implementations of the ports in [`crate::ports`].
//! The in-memory ones here are reference implementations sufficient for
//! embedding, testing, and as a template for a persistent backend.

pub mod memory_snapshot;
pub mod memory_store;
pub mod validation_context;

pub use memory_snapshot::InMemorySnapshotManager;
pub use memory_store::InMemoryEventStore;
pub use validation_context::ReconstructorValidationContext;
