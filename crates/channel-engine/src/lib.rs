//! # channel-engine
//!
//! The event-sourced state channel engine: an append-only event log with
//! stable references and synchronous fan-out, a canonical
//! content-addressed event model, snapshot-accelerated state
//! reconstruction, and the DirectFund objective "Crank" state machine.
//!
//! Layered hexagonally:
//!
//! - [`domain`] — pure data and pure functions: the event model,
//!   canonical identity, folds, and the objective crank. No I/O, no
//!   locks.
//! - [`ports`] — the traits the domain needs satisfied by the outside
//!   world: [`ports::EventStore`], [`ports::SnapshotStore`],
//!   [`ports::ValidationContext`].
//! - [`adapters`] — in-memory implementations of the ports, sufficient
//!   to embed the engine directly or as a template for a persistent
//!   backend.

#![warn(missing_docs)]

pub mod adapters;
pub mod crank_context;
pub mod domain;
pub mod ports;

pub use crank_context::Secp256k1CrankContext;
pub use domain::event::Event;
pub use domain::objective::{
    CrankContext, CrankResult, DirectFundObjective, DirectFundStatus, Message, ObjectiveEvent,
    SideEffect, Transaction, WaitingFor,
};
pub use domain::reconstruct::{ChannelState, ChannelStatus, ObjectiveState, ObjectiveStatus, StateReconstructor};
pub use ports::{EventStore, Snapshot, SnapshotStore, SubscriptionId, ValidationContext};
