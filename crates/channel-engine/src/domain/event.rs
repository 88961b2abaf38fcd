//! The event model: twenty strongly typed variants partitioned into four
//! domains (objective lifecycle, channel state, chain bridge, messaging),
//! plus the channel data model they carry.
//!
//! One outer enum, one payload struct per variant, `#[serde(tag =
//! "kind")]` for a self-describing wire form.

use channel_types::{Address, Bytes32, Hash, Signature, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::identity::{channel_id, event_id, state_hash};
use crate::domain::reconstruct::ObjectiveStatus;
use crate::ports::validation::ValidationContext;

/// The immutable parameters of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPart {
    /// Ordered participant addresses, 2..=255 of them.
    pub participants: Vec<Address>,
    /// Per-deployment salt distinguishing otherwise-identical channels.
    pub channel_nonce: u64,
    /// Address of the application's rules contract.
    pub app_definition: Address,
    /// Dispute window length, in chain-specific time units. Must be >= 1.
    pub challenge_duration: u32,
}

impl FixedPart {
    /// Derive this channel's id.
    pub fn channel_id(&self) -> Hash {
        channel_id(self)
    }
}

/// Allocation type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationType {
    /// A direct, unconditional payout.
    Simple = 0,
    /// A conditional payout backed by another channel's outcome.
    Guarantee = 1,
}

/// One beneficiary and amount within an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// 32-byte destination (an address left-padded to 32 bytes, or another
    /// channel's id for a guarantee).
    pub destination: Bytes32,
    /// Amount, in the asset's smallest unit.
    pub amount: u128,
    /// Whether this is a simple or conditional allocation.
    pub asset_type: AllocationType,
    /// Opaque, application-defined metadata.
    pub metadata: Vec<u8>,
}

/// An asset plus the ordered list of allocations describing who is owed
/// what if the channel finalizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// The asset being allocated; the zero address denotes the native
    /// asset.
    pub asset: Address,
    /// Ordered allocations; order affects the state hash.
    pub allocations: Vec<Allocation>,
}

impl Outcome {
    /// An outcome with no allocations, used for the prefund state.
    pub fn empty(asset: Address) -> Self {
        Self {
            asset,
            allocations: Vec::new(),
        }
    }
}

/// The mutable portion of a channel state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariablePart {
    /// Opaque application data blob.
    pub app_data: Vec<u8>,
    /// Who gets what if this state finalizes.
    pub outcome: Outcome,
    /// Monotonically increasing turn number.
    pub turn_num: u64,
    /// Whether this state is a candidate for finalization.
    pub is_final: bool,
}

/// A full channel state: `FixedPart` union `VariablePart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// The channel's immutable parameters.
    pub fixed: FixedPart,
    /// This state's mutable fields.
    pub variable: VariablePart,
}

impl State {
    /// The Keccak-256 hash of this state's packed encoding.
    pub fn hash(&self) -> Hash {
        state_hash(self)
    }
}

/// The kind of long-running protocol an objective pursues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveType {
    /// Jointly fund a new channel.
    DirectFund,
    /// Jointly defund (close out) a channel.
    DirectDefund,
    /// Fund a channel via an intermediary (virtual channel opening).
    VirtualFund,
    /// Defund a channel opened via an intermediary.
    VirtualDefund,
}

/// Reason a received or processed message was dropped instead of acted
/// on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDropErrorCode {
    /// The wire payload failed to decode.
    DecodeFailed,
    /// A carried signature did not recover to its claimed signer.
    SignatureInvalid,
    /// The message referenced an unknown channel.
    ChannelUnknown,
    /// A structurally valid but semantically invalid payload.
    PayloadInvalid,
    /// The message reused an id already seen (replay).
    ReplayAttack,
}

/// Payload of an `objective-created` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveCreated {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The objective's id.
    pub objective_id: Bytes32,
    /// Which protocol this objective pursues.
    pub objective_type: ObjectiveType,
    /// The channel this objective concerns.
    pub channel_id: Bytes32,
    /// The channel's participants, in canonical order.
    pub participants: Vec<Address>,
}

/// Payload of an `objective-approved` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveApproved {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The objective's id.
    pub objective_id: Bytes32,
    /// The participant who approved, if known.
    pub approver: Option<Address>,
}

/// Payload of an `objective-rejected` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveRejected {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The objective's id.
    pub objective_id: Bytes32,
    /// Human-readable rejection reason.
    pub reason: String,
    /// Machine-readable rejection code, if any.
    pub error_code: Option<String>,
}

/// Payload of an `objective-cranked` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveCranked {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The objective's id.
    pub objective_id: Bytes32,
    /// How many side effects this crank call emitted.
    pub side_effects_count: u32,
    /// Whether the objective is still waiting for more input.
    pub waiting: bool,
}

/// Payload of an `objective-completed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveCompleted {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The objective's id.
    pub objective_id: Bytes32,
    /// Whether the objective reached its goal successfully.
    pub success: bool,
    /// Hash of the channel's final agreed state, if applicable.
    pub final_channel_state: Option<Hash>,
}

/// Payload of a `channel-created` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCreated {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The declared channel id; must equal the id derived from the
    /// remaining fields.
    pub channel_id: Bytes32,
    /// Ordered participant addresses.
    pub participants: Vec<Address>,
    /// Per-deployment salt.
    pub channel_nonce: u64,
    /// Application rules contract address.
    pub app_definition: Address,
    /// Dispute window length.
    pub challenge_duration: u32,
}

/// Payload of a `state-signed` event: a state this node signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSigned {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The channel this state belongs to.
    pub channel_id: Bytes32,
    /// The state's turn number.
    pub turn_num: u64,
    /// The signed state's hash.
    pub state_hash: Hash,
    /// The signer's address.
    pub signer: Address,
    /// The signature over `state_hash`.
    pub signature: Signature,
    /// Whether this state is a finalization candidate.
    pub is_final: bool,
    /// Hash of the state's application data blob, if tracked separately.
    pub app_data_hash: Option<Hash>,
}

/// Payload of a `state-received` event: a signed state from a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateReceived {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The channel this state belongs to.
    pub channel_id: Bytes32,
    /// The state's turn number.
    pub turn_num: u64,
    /// The signed state's hash.
    pub state_hash: Hash,
    /// The claimed signer's address.
    pub signer: Address,
    /// The signature over `state_hash`.
    pub signature: Signature,
    /// Whether this state is a finalization candidate.
    pub is_final: bool,
    /// Transport-level id of the sending peer, if known.
    pub peer_id: Option<String>,
}

/// Payload of a `state-supported-updated` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSupportedUpdated {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The channel whose support advanced.
    pub channel_id: Bytes32,
    /// The newly supported turn number.
    pub supported_turn: u64,
    /// Hash of the newly supported state.
    pub state_hash: Hash,
    /// Number of signatures backing the new support. Must be >= 1.
    pub num_signatures: u32,
    /// The previously supported turn number.
    pub prev_supported_turn: u64,
}

/// Payload of a `channel-finalized` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFinalized {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The channel that finalized.
    pub channel_id: Bytes32,
    /// The turn number at which it finalized.
    pub final_turn: u64,
    /// Hash of the final agreed state.
    pub final_state_hash: Hash,
}

/// Payload of a `deposit-detected` event (chain bridge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositDetected {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The channel being funded.
    pub channel_id: Bytes32,
    /// Block number the deposit was observed in.
    pub block_num: u64,
    /// Transaction index within the block.
    pub tx_index: u32,
    /// Transaction hash, if tracked.
    pub tx_hash: Option<Hash>,
    /// The deposited asset.
    pub asset: Address,
    /// Amount deposited in this transaction, as a decimal string.
    pub amount_deposited: String,
    /// Total now held for this channel/asset, as a decimal string.
    pub now_held: String,
}

/// Payload of an `allocation-updated` event (chain bridge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationUpdated {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The channel whose on-chain holdings changed.
    pub channel_id: Bytes32,
    /// Block number the change was observed in.
    pub block_num: u64,
    /// Transaction index within the block.
    pub tx_index: u32,
    /// Transaction hash, if tracked.
    pub tx_hash: Option<Hash>,
    /// The affected asset.
    pub asset: Address,
    /// New total held, as a decimal string.
    pub new_amount: String,
}

/// Payload of a `challenge-registered` event (chain bridge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeRegistered {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The challenged channel.
    pub channel_id: Bytes32,
    /// Block number the challenge was observed in.
    pub block_num: u64,
    /// Transaction index within the block.
    pub tx_index: u32,
    /// Transaction hash, if tracked.
    pub tx_hash: Option<Hash>,
    /// The turn number recorded by the challenge.
    pub turn_num_record: u64,
    /// Unix timestamp at which the dispute window closes.
    pub finalization_time: u64,
    /// The address that registered the challenge.
    pub challenger: Address,
    /// Whether the candidate state was marked final.
    pub is_final: bool,
    /// Hash of the candidate state, if tracked.
    pub candidate_state_hash: Option<Hash>,
}

/// Payload of a `challenge-cleared` event (chain bridge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeCleared {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The channel whose challenge cleared.
    pub channel_id: Bytes32,
    /// Block number the clearing was observed in.
    pub block_num: u64,
    /// Transaction index within the block.
    pub tx_index: u32,
    /// Transaction hash, if tracked.
    pub tx_hash: Option<Hash>,
    /// The turn number record after clearing. Must exceed the turn
    /// number record of the challenge it clears.
    pub new_turn_num_record: u64,
}

/// Payload of a `channel-concluded` event (chain bridge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConcluded {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The concluded channel.
    pub channel_id: Bytes32,
    /// Block number the conclusion was observed in.
    pub block_num: u64,
    /// Transaction index within the block.
    pub tx_index: u32,
    /// Transaction hash, if tracked.
    pub tx_hash: Option<Hash>,
    /// Turn number the channel concluded at, if recorded on-chain.
    pub finalized_at_turn: Option<u64>,
}

/// Payload of a `withdraw-completed` event (chain bridge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawCompleted {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The channel funds were withdrawn from.
    pub channel_id: Bytes32,
    /// Block number the withdrawal was observed in.
    pub block_num: u64,
    /// Transaction index within the block.
    pub tx_index: u32,
    /// Transaction hash, if tracked.
    pub tx_hash: Option<Hash>,
    /// Who received the funds.
    pub recipient: Address,
    /// Which asset was withdrawn.
    pub asset: Address,
    /// Amount withdrawn, as a decimal string.
    pub amount: String,
}

/// Payload of a `message-sent` event (messaging).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSent {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The message's id.
    pub message_id: Bytes32,
    /// The destination peer's transport id.
    pub peer_id: String,
    /// The objective this message concerns.
    pub objective_id: Bytes32,
    /// Application-defined payload type tag, if any.
    pub payload_type: Option<String>,
    /// Size of the encoded payload, in bytes.
    pub payload_size_bytes: u32,
}

/// Payload of a `message-received` event (messaging).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReceived {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The message's id.
    pub message_id: Bytes32,
    /// The source peer's transport id.
    pub peer_id: String,
    /// The objective this message concerns.
    pub objective_id: Bytes32,
    /// Application-defined payload type tag, if any.
    pub payload_type: Option<String>,
    /// Size of the encoded payload, in bytes.
    pub payload_size_bytes: u32,
}

/// Payload of a `message-acked` event (messaging).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAcked {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The acknowledged message's id.
    pub message_id: Bytes32,
    /// The acking peer's transport id.
    pub peer_id: String,
    /// Measured round-trip time, in milliseconds.
    pub roundtrip_ms: u64,
}

/// Payload of a `message-dropped` event (messaging).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDropped {
    /// Event schema version; currently always 1.
    pub event_version: u8,
    /// Wall-clock time the event was recorded, in milliseconds since
    /// the Unix epoch. Supplied by the caller, never read internally.
    pub timestamp_ms: u64,
    /// The dropped message's id, if it was known.
    pub message_id: Option<Bytes32>,
    /// The peer the message was to/from.
    pub peer_id: String,
    /// Human-readable drop reason.
    pub reason: String,
    /// Machine-readable drop reason code.
    pub error_code: MessageDropErrorCode,
    /// Size of the dropped payload, in bytes.
    pub payload_size_bytes: u32,
}

/// A tagged union of the twenty event kinds the engine understands
///. Serialized with an internal `kind` tag whose value is
/// the kebab-case variant name used in [`Event::kind_name`] and in
/// content-addressed event ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Event {
    /// See [`ObjectiveCreated`].
    ObjectiveCreated(ObjectiveCreated),
    /// See [`ObjectiveApproved`].
    ObjectiveApproved(ObjectiveApproved),
    /// See [`ObjectiveRejected`].
    ObjectiveRejected(ObjectiveRejected),
    /// See [`ObjectiveCranked`].
    ObjectiveCranked(ObjectiveCranked),
    /// See [`ObjectiveCompleted`].
    ObjectiveCompleted(ObjectiveCompleted),
    /// See [`ChannelCreated`].
    ChannelCreated(ChannelCreated),
    /// See [`StateSigned`].
    StateSigned(StateSigned),
    /// See [`StateReceived`].
    StateReceived(StateReceived),
    /// See [`StateSupportedUpdated`].
    StateSupportedUpdated(StateSupportedUpdated),
    /// See [`ChannelFinalized`].
    ChannelFinalized(ChannelFinalized),
    /// See [`DepositDetected`].
    DepositDetected(DepositDetected),
    /// See [`AllocationUpdated`].
    AllocationUpdated(AllocationUpdated),
    /// See [`ChallengeRegistered`].
    ChallengeRegistered(ChallengeRegistered),
    /// See [`ChallengeCleared`].
    ChallengeCleared(ChallengeCleared),
    /// See [`ChannelConcluded`].
    ChannelConcluded(ChannelConcluded),
    /// See [`WithdrawCompleted`].
    WithdrawCompleted(WithdrawCompleted),
    /// See [`MessageSent`].
    MessageSent(MessageSent),
    /// See [`MessageReceived`].
    MessageReceived(MessageReceived),
    /// See [`MessageAcked`].
    MessageAcked(MessageAcked),
    /// See [`MessageDropped`].
    MessageDropped(MessageDropped),
}

impl Event {
    /// The event's kebab-case kind name, as used in the `kind` wire tag
    /// and as the `name` component of its content-addressed id.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::ObjectiveCreated(_) => "objective-created",
            Event::ObjectiveApproved(_) => "objective-approved",
            Event::ObjectiveRejected(_) => "objective-rejected",
            Event::ObjectiveCranked(_) => "objective-cranked",
            Event::ObjectiveCompleted(_) => "objective-completed",
            Event::ChannelCreated(_) => "channel-created",
            Event::StateSigned(_) => "state-signed",
            Event::StateReceived(_) => "state-received",
            Event::StateSupportedUpdated(_) => "state-supported-updated",
            Event::ChannelFinalized(_) => "channel-finalized",
            Event::DepositDetected(_) => "deposit-detected",
            Event::AllocationUpdated(_) => "allocation-updated",
            Event::ChallengeRegistered(_) => "challenge-registered",
            Event::ChallengeCleared(_) => "challenge-cleared",
            Event::ChannelConcluded(_) => "channel-concluded",
            Event::WithdrawCompleted(_) => "withdraw-completed",
            Event::MessageSent(_) => "message-sent",
            Event::MessageReceived(_) => "message-received",
            Event::MessageAcked(_) => "message-acked",
            Event::MessageDropped(_) => "message-dropped",
        }
    }

    /// The objective id this event mentions, if it is an objective-domain
    /// event.
    pub fn objective_id(&self) -> Option<Bytes32> {
        match self {
            Event::ObjectiveCreated(p) => Some(p.objective_id),
            Event::ObjectiveApproved(p) => Some(p.objective_id),
            Event::ObjectiveRejected(p) => Some(p.objective_id),
            Event::ObjectiveCranked(p) => Some(p.objective_id),
            Event::ObjectiveCompleted(p) => Some(p.objective_id),
            _ => None,
        }
    }

    /// The channel id this event mentions, if any.
    pub fn channel_id(&self) -> Option<Bytes32> {
        match self {
            Event::ChannelCreated(p) => Some(p.channel_id),
            Event::StateSigned(p) => Some(p.channel_id),
            Event::StateReceived(p) => Some(p.channel_id),
            Event::StateSupportedUpdated(p) => Some(p.channel_id),
            Event::ChannelFinalized(p) => Some(p.channel_id),
            Event::DepositDetected(p) => Some(p.channel_id),
            Event::AllocationUpdated(p) => Some(p.channel_id),
            Event::ChallengeRegistered(p) => Some(p.channel_id),
            Event::ChallengeCleared(p) => Some(p.channel_id),
            Event::ChannelConcluded(p) => Some(p.channel_id),
            Event::WithdrawCompleted(p) => Some(p.channel_id),
            _ => None,
        }
    }

    /// The content-addressed id of this event. Computed over
    /// the inner payload only; the outer `kind` tag is not part of the
    /// hashed bytes but the kind name is, as the domain-separating
    /// `name` component.
    pub fn event_id(&self) -> Bytes32 {
        let name = self.kind_name();
        let result = match self {
            Event::ObjectiveCreated(p) => event_id(name, p),
            Event::ObjectiveApproved(p) => event_id(name, p),
            Event::ObjectiveRejected(p) => event_id(name, p),
            Event::ObjectiveCranked(p) => event_id(name, p),
            Event::ObjectiveCompleted(p) => event_id(name, p),
            Event::ChannelCreated(p) => event_id(name, p),
            Event::StateSigned(p) => event_id(name, p),
            Event::StateReceived(p) => event_id(name, p),
            Event::StateSupportedUpdated(p) => event_id(name, p),
            Event::ChannelFinalized(p) => event_id(name, p),
            Event::DepositDetected(p) => event_id(name, p),
            Event::AllocationUpdated(p) => event_id(name, p),
            Event::ChallengeRegistered(p) => event_id(name, p),
            Event::ChallengeCleared(p) => event_id(name, p),
            Event::ChannelConcluded(p) => event_id(name, p),
            Event::WithdrawCompleted(p) => event_id(name, p),
            Event::MessageSent(p) => event_id(name, p),
            Event::MessageReceived(p) => event_id(name, p),
            Event::MessageAcked(p) => event_id(name, p),
            Event::MessageDropped(p) => event_id(name, p),
        };
        // Canonicalization can only fail on non-finite floats or invalid
        // UTF-8, neither of which these payload types can ever produce:
        // every string field is a Rust `String`/`&str` (always valid
        // UTF-8) and every numeric field is an integer.
        result.expect("event payloads are always canonicalizable")
    }

    /// Run this event's structural and contextual validation.
    /// Advisory: the store does not call this itself, the emitting
    /// component must.
    pub fn validate(&self, ctx: &dyn ValidationContext) -> Result<(), ValidationError> {
        let result = self.validate_inner(ctx);
        if let Err(ref err) = result {
            warn!(kind = self.kind_name(), %err, "event failed validation");
        }
        result
    }

    fn validate_inner(&self, ctx: &dyn ValidationContext) -> Result<(), ValidationError> {
        match self {
            Event::ObjectiveCreated(p) => validate_objective_created(p),
            Event::ObjectiveApproved(p) => validate_objective_transition(
                ctx,
                p.objective_id,
                &[ObjectiveStatus::Created],
            ),
            Event::ObjectiveRejected(p) => validate_objective_transition(
                ctx,
                p.objective_id,
                &[
                    ObjectiveStatus::Created,
                    ObjectiveStatus::Approved,
                    ObjectiveStatus::Cranked,
                ],
            ),
            Event::ObjectiveCranked(p) => validate_objective_transition(
                ctx,
                p.objective_id,
                &[ObjectiveStatus::Approved, ObjectiveStatus::Cranked],
            ),
            Event::ObjectiveCompleted(p) => validate_objective_transition(
                ctx,
                p.objective_id,
                &[ObjectiveStatus::Approved, ObjectiveStatus::Cranked],
            ),
            Event::ChannelCreated(p) => validate_channel_created(p),
            Event::StateSigned(p) => validate_signed_state(
                ctx,
                p.channel_id,
                p.turn_num,
                p.state_hash,
                p.signer,
                p.signature,
            ),
            Event::StateReceived(p) => validate_signed_state(
                ctx,
                p.channel_id,
                p.turn_num,
                p.state_hash,
                p.signer,
                p.signature,
            ),
            Event::StateSupportedUpdated(p) => validate_supported_updated(ctx, p),
            Event::ChannelFinalized(p) => validate_channel_finalized(ctx, p),
            Event::DepositDetected(p) => require_channel(ctx, p.channel_id),
            Event::AllocationUpdated(p) => require_channel(ctx, p.channel_id),
            Event::ChallengeRegistered(p) => require_channel(ctx, p.channel_id),
            Event::ChallengeCleared(p) => validate_challenge_cleared(ctx, p),
            Event::ChannelConcluded(p) => require_channel(ctx, p.channel_id),
            Event::WithdrawCompleted(p) => require_channel(ctx, p.channel_id),
            Event::MessageSent(_) => Ok(()),
            Event::MessageReceived(_) => Ok(()),
            Event::MessageAcked(_) => Ok(()),
            Event::MessageDropped(_) => Ok(()),
        }
    }
}

const MIN_PARTICIPANTS: usize = 2;
const MAX_PARTICIPANTS: usize = 255;

fn validate_participants(participants: &[Address]) -> Result<(), ValidationError> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(ValidationError::InsufficientParticipants(
            participants.len(),
        ));
    }
    if participants.len() > MAX_PARTICIPANTS {
        return Err(ValidationError::TooManyParticipants(participants.len()));
    }
    Ok(())
}

fn validate_objective_created(p: &ObjectiveCreated) -> Result<(), ValidationError> {
    validate_participants(&p.participants)
}

fn validate_channel_created(p: &ChannelCreated) -> Result<(), ValidationError> {
    validate_participants(&p.participants)?;
    if p.challenge_duration < 1 {
        return Err(ValidationError::InvalidChallengeDuration(
            p.challenge_duration,
        ));
    }
    let fixed = FixedPart {
        participants: p.participants.clone(),
        channel_nonce: p.channel_nonce,
        app_definition: p.app_definition,
        challenge_duration: p.challenge_duration,
    };
    let derived = fixed.channel_id();
    if derived != p.channel_id {
        return Err(ValidationError::ChannelIdMismatch {
            declared: p.channel_id,
            derived,
        });
    }
    Ok(())
}

/// Require that an objective exists and is currently in one of `allowed`
/// statuses, enforcing the lifecycle sequencing created -> approved |
/// rejected -> cranked* -> completed | rejected, terminal once rejected
/// or completed.
fn validate_objective_transition(
    ctx: &dyn ValidationContext,
    id: Bytes32,
    allowed: &[ObjectiveStatus],
) -> Result<(), ValidationError> {
    let status = ctx
        .objective_status(id)
        .ok_or(ValidationError::ObjectiveNotFound(id))?;
    if allowed.contains(&status) {
        Ok(())
    } else {
        Err(ValidationError::InvalidObjectiveTransition {
            context: format!(
                "objective {id} is {status:?}, expected one of {allowed:?}"
            ),
        })
    }
}

fn require_channel(ctx: &dyn ValidationContext, id: Bytes32) -> Result<(), ValidationError> {
    if ctx.channel_exists(id) {
        Ok(())
    } else {
        Err(ValidationError::ChannelNotFound(id))
    }
}

/// Shared validation for `state-signed`/`state-received`: the channel
/// must exist, the signature must recover to the claimed signer, the
/// signer must be a participant, and turn numbers from this signer must
/// be strictly monotonic per signer, not sequential across signers.
fn validate_signed_state(
    ctx: &dyn ValidationContext,
    channel_id: Bytes32,
    turn_num: u64,
    state_hash: Hash,
    signer: Address,
    signature: Signature,
) -> Result<(), ValidationError> {
    let participants = ctx
        .channel_participants(channel_id)
        .ok_or(ValidationError::ChannelNotFound(channel_id))?;

    let recovered = ctx.recover_signer(state_hash, signature)?;
    if recovered != signer {
        return Err(ValidationError::SignatureInvalid);
    }
    if !participants.contains(&signer) {
        return Err(ValidationError::SignerNotParticipant);
    }
    if let Some(prev) = ctx.last_turn_for_signer(channel_id, signer) {
        if turn_num <= prev {
            return Err(ValidationError::InvalidTurnProgression {
                context: format!(
                    "turn {turn_num} does not strictly exceed signer's previous turn {prev}"
                ),
            });
        }
    }
    Ok(())
}

fn validate_supported_updated(
    ctx: &dyn ValidationContext,
    p: &StateSupportedUpdated,
) -> Result<(), ValidationError> {
    require_channel(ctx, p.channel_id)?;
    if p.num_signatures < 1 {
        return Err(ValidationError::NoSignatures);
    }
    if p.supported_turn <= p.prev_supported_turn {
        return Err(ValidationError::InvalidTurnProgression {
            context: format!(
                "supported turn {} does not strictly exceed previous supported turn {}",
                p.supported_turn, p.prev_supported_turn
            ),
        });
    }
    Ok(())
}

/// A channel can only finalize once every participant has signed an
/// `is_final` state at the declared turn and hash.
fn validate_channel_finalized(
    ctx: &dyn ValidationContext,
    p: &ChannelFinalized,
) -> Result<(), ValidationError> {
    let participants = ctx
        .channel_participants(p.channel_id)
        .ok_or(ValidationError::ChannelNotFound(p.channel_id))?;
    let signers = ctx.final_signers_at(p.channel_id, p.final_turn, p.final_state_hash);
    for participant in &participants {
        if !signers.contains(participant) {
            return Err(ValidationError::IncompleteFinalization {
                channel_id: p.channel_id,
                missing: *participant,
            });
        }
    }
    Ok(())
}

/// A challenge can only clear with a turn number record that strictly
/// exceeds the one it clears.
fn validate_challenge_cleared(
    ctx: &dyn ValidationContext,
    p: &ChallengeCleared,
) -> Result<(), ValidationError> {
    require_channel(ctx, p.channel_id)?;
    if let Some(prev) = ctx.last_challenge_turn_record(p.channel_id) {
        if p.new_turn_num_record <= prev {
            return Err(ValidationError::InvalidTurnProgression {
                context: format!(
                    "challenge clearing turn record {} does not strictly exceed registered turn record {}",
                    p.new_turn_num_record, prev
                ),
            });
        }
    }
    Ok(())
}
