//! # channel-types
//!
//! Shared primitive value types and the error taxonomy used across the
//! channel engine. This crate has no behavior of its own; it exists so
//! that `channel-crypto` and `channel-engine` agree on wire-level
//! representations without a dependency cycle.

#![warn(missing_docs)]

pub mod errors;
pub mod primitives;

pub use errors::{CanonicalizationError, CrankError, ReconstructError, StoreError, ValidationError};
pub use primitives::{Address, Bytes32, EventId, EventOffset, Hash, Signature};
