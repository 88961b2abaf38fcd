//! Error taxonomy shared across the channel engine.
//!
//! One dedicated `thiserror` enum per concern rather than one monolithic
//! error type.

use crate::primitives::{Bytes32, EventOffset};
use thiserror::Error;

/// Canonicalization/identity errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// A string field contained invalid UTF-8.
    #[error("invalid UTF-8 in canonicalized field")]
    InvalidUtf8,
    /// A numeric field was NaN or infinite.
    #[error("non-finite number cannot be canonicalized")]
    InvalidPayload,
}

/// Errors raised by [`crate`]-level event structural/precondition validation
///.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Referenced objective does not exist in the validation context.
    #[error("objective not found: {0}")]
    ObjectiveNotFound(Bytes32),
    /// Referenced channel does not exist in the validation context.
    #[error("channel not found: {0}")]
    ChannelNotFound(Bytes32),
    /// Participant list below the 2-participant minimum.
    #[error("insufficient participants: {0} (minimum 2)")]
    InsufficientParticipants(usize),
    /// Participant list above the 255-participant maximum.
    #[error("too many participants: {0} (maximum 255)")]
    TooManyParticipants(usize),
    /// Challenge duration was zero.
    #[error("invalid challenge duration: {0} (must be >= 1)")]
    InvalidChallengeDuration(u32),
    /// Turn number did not strictly increase per signer, or a supported
    /// turn did not strictly exceed the previous supported turn.
    #[error("invalid turn progression: {context}")]
    InvalidTurnProgression {
        /// Human-readable description of the violated ordering.
        context: String,
    },
    /// A `state-supported-updated` event declared zero signatures.
    #[error("no signatures present, at least one required")]
    NoSignatures,
    /// `channel-created`'s declared `channel_id` did not match the
    /// `ChannelId` derived from its `FixedPart`.
    #[error("channel id mismatch: declared {declared} derived {derived}")]
    ChannelIdMismatch {
        /// The id carried by the event.
        declared: Bytes32,
        /// The id recomputed from `FixedPart`.
        derived: Bytes32,
    },
    /// A signature did not recover to its claimed signer.
    #[error("signature invalid: does not recover to claimed signer")]
    SignatureInvalid,
    /// A recovered/claimed signer is not one of the channel's participants.
    #[error("signer not a channel participant")]
    SignerNotParticipant,
    /// An objective lifecycle event arrived while the objective was in a
    /// status that does not permit it (e.g. re-approving or re-completing
    /// a terminal objective).
    #[error("invalid objective transition: {context}")]
    InvalidObjectiveTransition {
        /// Human-readable description of the violated transition.
        context: String,
    },
    /// A `channel-finalized` event arrived without every participant
    /// having signed an `is_final` state at the declared turn and hash.
    #[error("channel {channel_id} finalized without a final signature from {missing}")]
    IncompleteFinalization {
        /// The channel that was declared finalized.
        channel_id: Bytes32,
        /// A participant who has not signed the final state.
        missing: crate::primitives::Address,
    },
}

/// Errors raised when reading from or appending to the event store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// `read_at` was called with an offset `>= len()`.
    #[error("offset {0} out of bounds")]
    OffsetOutOfBounds(EventOffset),
    /// `read_range` was called with `start >= end` or `end > len()`.
    #[error("invalid range [{start}, {end})")]
    InvalidRange {
        /// Requested range start.
        start: EventOffset,
        /// Requested range end.
        end: EventOffset,
    },
    /// The backing allocation for a new slot failed.
    #[error("allocation failed while appending event")]
    AllocationFailed,
}

/// Errors raised while folding events into entity state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconstructError {
    /// No events in the log mention the requested entity id.
    #[error("no events found for id {0}")]
    NotFound(Bytes32),
    /// The first event mentioning the entity id was not the expected
    /// creation-kind event.
    #[error("expected a creation event first for id {0}, found a different kind")]
    InvalidFirstEvent(Bytes32),
}

/// Errors raised by the objective crank function.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrankError {
    /// Wraps a [`ValidationError`] surfaced during signature checking.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The received state hash didn't match the locally computed hash for
    /// the corresponding canonical state (prefund/postfund).
    #[error("state hash mismatch for objective {objective_id}")]
    StateHashMismatch {
        /// The objective under crank.
        objective_id: Bytes32,
    },
    /// A second, differing signature arrived for the same `(turn_num,
    /// signer)` slot.
    #[error("signature conflict for objective {objective_id} turn {turn_num} signer {signer}")]
    SignatureConflict {
        /// The objective under crank.
        objective_id: Bytes32,
        /// The disputed turn number.
        turn_num: u64,
        /// The signer whose slot already held a different signature.
        signer: crate::primitives::Address,
    },
    /// Crank was called on a terminal (`Complete`/`Rejected`) objective.
    #[error("objective {0} is already terminal")]
    AlreadyTerminal(Bytes32),
    /// An input arrived for a transition whose precondition the current
    /// state does not satisfy (e.g. a deposit before prefund consensus).
    #[error("precondition not met for objective {objective_id}: {context}")]
    PreconditionNotMet {
        /// The objective under crank.
        objective_id: Bytes32,
        /// Human-readable description of the unmet precondition.
        context: String,
    },
}
