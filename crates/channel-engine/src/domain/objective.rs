//! The DirectFund objective engine: the pure "Crank" state machine that
//! drives a joint-funding objective to completion.
//!
//! A plain data struct plus a free `crank`-style transition function
//! rather than an object with internal mutation hidden behind methods:
//! state is visible, the transition is total and referentially
//! transparent given `(state, event, ctx)`.

use channel_types::{Address, Bytes32, CrankError, Hash, Signature, ValidationError};
use tracing::{info, warn};

use crate::domain::event::{FixedPart, Outcome, State, VariablePart};

/// Lifecycle status of a [`DirectFundObjective`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectFundStatus {
    /// Created locally, not yet approved by this node.
    Unapproved,
    /// Approved locally; prefunding/funding/postfunding in progress.
    Approved,
    /// All postfund signatures collected. Terminal.
    Complete,
    /// Rejected. Terminal.
    Rejected,
}

/// Declarative reason a [`DirectFundObjective`] cannot currently make
/// progress without more input. Always a pure function of
/// the objective's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitingFor {
    /// Not blocked; the objective is terminal or momentarily idle.
    Nothing,
    /// Waiting for this node to locally approve the objective.
    Approval,
    /// Waiting for every participant's prefund signature.
    CompletePrefund,
    /// This node's deposit is next; waiting for it to be submitted and
    /// observed.
    MyTurnToFund,
    /// Waiting for every participant's deposit to be observed on chain.
    CompleteFunding,
    /// Waiting for every participant's postfund signature.
    CompletePostfund,
}

/// A message side effect: a signed state to deliver to peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Recipients, by address.
    pub to: Vec<Address>,
    /// The objective this message concerns.
    pub objective_id: Bytes32,
    /// The turn number of the carried state.
    pub turn_num: u64,
    /// The hash of the carried state.
    pub state_hash: Hash,
    /// This node's signature over `state_hash`.
    pub signature: Signature,
}

/// A transaction side effect: an on-chain deposit to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// The channel being funded.
    pub channel_id: Bytes32,
    /// The asset to deposit.
    pub asset: Address,
    /// The amount to deposit, in the asset's smallest unit.
    pub amount: u128,
}

/// One descriptor of work a [`crate::domain::objective`] crank wants the
/// surrounding runtime to perform.
#[derive(Debug, Clone)]
pub enum SideEffect {
    /// Deliver a signed state to peers.
    SendMessage(Message),
    /// Submit an on-chain transaction.
    SubmitTx(Transaction),
    /// Record a domain event back into the event store, atomically with
    /// the decision that produced it.
    EmitEvent(crate::domain::event::Event),
}

/// An input the DirectFund crank reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectiveEvent {
    /// This node has locally approved the objective.
    ApprovalGranted,
    /// A signed state arrived from a peer.
    StateReceived {
        /// The channel the state belongs to.
        channel_id: Bytes32,
        /// The state's turn number.
        turn_num: u64,
        /// The full state (needed to recompute and compare its hash).
        state: State,
        /// The claimed signer's signature over the state hash.
        signature: Signature,
        /// The claimed signer.
        from: Address,
    },
    /// An on-chain deposit was observed.
    DepositDetected {
        /// The funded channel.
        channel_id: Bytes32,
        /// The deposited asset.
        asset: Address,
        /// The amount deposited.
        amount: u128,
        /// Who made the deposit.
        depositor: Address,
    },
    /// The objective has been rejected.
    Rejection {
        /// Human-readable rejection reason.
        reason: String,
    },
}

/// Result of a single [`DirectFundObjective::crank`] call.
#[derive(Debug, Clone)]
pub struct CrankResult {
    /// Side effects the runtime must execute.
    pub side_effects: Vec<SideEffect>,
    /// Why the objective can't progress further right now.
    pub waiting_for: WaitingFor,
}

/// Cryptographic and identity context the crank needs but must not own:
/// this node's signing capability and signature recovery.
pub trait CrankContext {
    /// Sign a state hash with this node's channel signing key.
    fn sign(&self, state_hash: Hash) -> Signature;

    /// Recover the signer of a signature over a state hash.
    fn recover_signer(&self, state_hash: Hash, signature: Signature) -> Result<Address, ValidationError>;
}

/// The joint-funding objective: collects prefund signatures, gates
/// deposits by participant index, collects postfund signatures (spec
/// §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectFundObjective {
    /// This objective's id.
    pub id: Bytes32,
    /// The channel being funded.
    pub channel_id: Bytes32,
    /// Current lifecycle status.
    pub status: DirectFundStatus,
    /// This node's index into `fixed.participants`.
    pub my_index: usize,
    /// The channel's immutable parameters.
    pub fixed: FixedPart,
    /// The target outcome once funding completes.
    pub funding_outcome: Outcome,
    /// Per-participant prefund signatures, indexed like `fixed.participants`.
    pub prefund_signatures: Vec<Option<Signature>>,
    /// Per-participant postfund signatures.
    pub postfund_signatures: Vec<Option<Signature>>,
    /// Per-participant on-chain deposit observation.
    pub deposits_detected: Vec<bool>,
}

impl DirectFundObjective {
    /// Build a fresh, unapproved objective for `my_index`'s participant.
    pub fn new(
        id: Bytes32,
        my_index: usize,
        fixed: FixedPart,
        funding_outcome: Outcome,
    ) -> Self {
        let n = fixed.participants.len();
        Self {
            id,
            channel_id: fixed.channel_id(),
            status: DirectFundStatus::Unapproved,
            my_index,
            fixed,
            funding_outcome,
            prefund_signatures: vec![None; n],
            postfund_signatures: vec![None; n],
            deposits_detected: vec![false; n],
        }
    }

    fn n(&self) -> usize {
        self.fixed.participants.len()
    }

    /// The canonical prefund state: turn 0, empty outcome.
    pub fn prefund_state(&self) -> State {
        State {
            fixed: self.fixed.clone(),
            variable: VariablePart {
                app_data: Vec::new(),
                outcome: Outcome::empty(self.funding_outcome.asset),
                turn_num: 0,
                is_final: false,
            },
        }
    }

    /// The canonical postfund state: turn `2n - 1`, the target outcome.
    pub fn postfund_state(&self) -> State {
        State {
            fixed: self.fixed.clone(),
            variable: VariablePart {
                app_data: Vec::new(),
                outcome: self.funding_outcome.clone(),
                turn_num: postfund_turn(self.n()),
                is_final: false,
            },
        }
    }

    /// Whether every participant's prefund signature is present.
    pub fn all_prefund_signed(&self) -> bool {
        self.prefund_signatures.iter().all(Option::is_some)
    }

    /// Whether every participant's postfund signature is present.
    pub fn all_postfund_signed(&self) -> bool {
        self.postfund_signatures.iter().all(Option::is_some)
    }

    /// Whether every participant's deposit has been observed.
    pub fn all_deposits_detected(&self) -> bool {
        self.deposits_detected.iter().all(|d| *d)
    }

    /// Whether every participant ahead of this node (by index) has
    /// deposited and this node has not yet deposited.
    pub fn my_turn_to_deposit(&self) -> bool {
        self.deposits_detected[..self.my_index].iter().all(|d| *d)
            && !self.deposits_detected[self.my_index]
    }

    fn other_participants(&self) -> Vec<Address> {
        self.fixed
            .participants
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.my_index)
            .map(|(_, addr)| *addr)
            .collect()
    }

    fn my_address(&self) -> Address {
        self.fixed.participants[self.my_index]
    }

    fn my_deposit_amount(&self) -> u128 {
        let target = destination_for(self.my_address());
        self.funding_outcome
            .allocations
            .iter()
            .find(|a| a.destination == target)
            .map(|a| a.amount)
            .unwrap_or(0)
    }

    /// Whether the objective has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, DirectFundStatus::Complete | DirectFundStatus::Rejected)
    }

    /// The current declarative blocking reason, a pure
    /// function of the objective's fields.
    pub fn waiting_for(&self) -> WaitingFor {
        match self.status {
            DirectFundStatus::Rejected | DirectFundStatus::Complete => WaitingFor::Nothing,
            DirectFundStatus::Unapproved => WaitingFor::Approval,
            DirectFundStatus::Approved => {
                if !self.all_prefund_signed() {
                    WaitingFor::CompletePrefund
                } else if self.my_turn_to_deposit() {
                    WaitingFor::MyTurnToFund
                } else if !self.all_deposits_detected() {
                    WaitingFor::CompleteFunding
                } else if !self.all_postfund_signed() {
                    WaitingFor::CompletePostfund
                } else {
                    WaitingFor::Nothing
                }
            }
        }
    }

    /// Run one step of the DirectFund state machine against `event`
    ///. Referentially transparent given the same
    /// `(self, event, ctx)`; mutates `self` in place on success. On
    /// failure `self` is left unchanged and no side effects are
    /// returned.
    pub fn crank(
        &mut self,
        event: &ObjectiveEvent,
        ctx: &dyn CrankContext,
    ) -> Result<CrankResult, CrankError> {
        if self.is_terminal() {
            warn!(objective_id = %self.id, "crank called on terminal objective");
            return Err(CrankError::AlreadyTerminal(self.id));
        }

        let mut side_effects = Vec::new();

        match event {
            ObjectiveEvent::Rejection { reason } => {
                self.status = DirectFundStatus::Rejected;
                info!(objective_id = %self.id, reason, "objective rejected");
            }
            ObjectiveEvent::ApprovalGranted => {
                if matches!(self.status, DirectFundStatus::Unapproved) {
                    let prefund_hash = self.prefund_state().hash();
                    let signature = ctx.sign(prefund_hash);
                    self.prefund_signatures[self.my_index] = Some(signature);
                    self.status = DirectFundStatus::Approved;
                    side_effects.push(SideEffect::SendMessage(Message {
                        to: self.other_participants(),
                        objective_id: self.id,
                        turn_num: 0,
                        state_hash: prefund_hash,
                        signature,
                    }));
                }
            }
            ObjectiveEvent::StateReceived {
                channel_id,
                turn_num,
                state,
                signature,
                from,
            } => {
                self.apply_state_received(*channel_id, *turn_num, state, *signature, *from, ctx, &mut side_effects)?;
            }
            ObjectiveEvent::DepositDetected {
                channel_id,
                depositor,
                ..
            } => {
                self.apply_deposit_detected(*channel_id, *depositor, ctx, &mut side_effects)?;
            }
        }

        Ok(CrankResult {
            side_effects,
            waiting_for: self.waiting_for(),
        })
    }

    fn apply_state_received(
        &mut self,
        channel_id: Bytes32,
        turn_num: u64,
        state: &State,
        signature: Signature,
        from: Address,
        ctx: &dyn CrankContext,
        side_effects: &mut Vec<SideEffect>,
    ) -> Result<(), CrankError> {
        if channel_id != self.channel_id {
            return Err(ValidationError::ChannelNotFound(channel_id).into());
        }
        if !matches!(self.status, DirectFundStatus::Approved) {
            return Err(CrankError::PreconditionNotMet {
                objective_id: self.id,
                context: "a signed state can only be accepted once this node has approved the objective".into(),
            });
        }

        let received_hash = state.hash();
        let recovered = ctx.recover_signer(received_hash, signature)?;
        if recovered != from {
            return Err(ValidationError::SignatureInvalid.into());
        }
        let Some(signer_index) = self.fixed.participants.iter().position(|p| *p == from) else {
            return Err(ValidationError::SignerNotParticipant.into());
        };

        if turn_num == 0 {
            if received_hash != self.prefund_state().hash() {
                return Err(CrankError::StateHashMismatch {
                    objective_id: self.id,
                });
            }
            store_signature(
                &mut self.prefund_signatures[signer_index],
                signature,
                self.id,
                turn_num,
                from,
            )?;
            if self.all_prefund_signed() && self.my_turn_to_deposit() {
                side_effects.push(SideEffect::SubmitTx(Transaction {
                    channel_id: self.channel_id,
                    asset: self.funding_outcome.asset,
                    amount: self.my_deposit_amount(),
                }));
            }
        } else if turn_num == postfund_turn(self.n()) {
            if !self.all_prefund_signed() || !self.all_deposits_detected() {
                return Err(CrankError::PreconditionNotMet {
                    objective_id: self.id,
                    context: "postfund signatures require prefund consensus and all deposits observed first".into(),
                });
            }
            if received_hash != self.postfund_state().hash() {
                return Err(CrankError::StateHashMismatch {
                    objective_id: self.id,
                });
            }
            store_signature(
                &mut self.postfund_signatures[signer_index],
                signature,
                self.id,
                turn_num,
                from,
            )?;
            if self.all_postfund_signed() {
                self.status = DirectFundStatus::Complete;
                info!(objective_id = %self.id, "objective complete");
            }
        } else {
            return Err(ValidationError::InvalidTurnProgression {
                context: format!(
                    "turn {turn_num} is neither the prefund turn (0) nor the postfund turn ({})",
                    postfund_turn(self.n())
                ),
            }
            .into());
        }

        Ok(())
    }

    fn apply_deposit_detected(
        &mut self,
        channel_id: Bytes32,
        depositor: Address,
        ctx: &dyn CrankContext,
        side_effects: &mut Vec<SideEffect>,
    ) -> Result<(), CrankError> {
        if channel_id != self.channel_id {
            return Err(ValidationError::ChannelNotFound(channel_id).into());
        }
        if !matches!(self.status, DirectFundStatus::Approved) || !self.all_prefund_signed() {
            return Err(CrankError::PreconditionNotMet {
                objective_id: self.id,
                context: "deposits are only accepted after prefund consensus".into(),
            });
        }
        let Some(idx) = self.fixed.participants.iter().position(|p| *p == depositor) else {
            return Err(ValidationError::SignerNotParticipant.into());
        };

        self.deposits_detected[idx] = true;

        if self.my_turn_to_deposit() {
            side_effects.push(SideEffect::SubmitTx(Transaction {
                channel_id: self.channel_id,
                asset: self.funding_outcome.asset,
                amount: self.my_deposit_amount(),
            }));
        }

        if self.all_deposits_detected() && self.postfund_signatures[self.my_index].is_none() {
            let postfund_hash = self.postfund_state().hash();
            let signature = ctx.sign(postfund_hash);
            self.postfund_signatures[self.my_index] = Some(signature);
            side_effects.push(SideEffect::SendMessage(Message {
                to: self.other_participants(),
                objective_id: self.id,
                turn_num: postfund_turn(self.n()),
                state_hash: postfund_hash,
                signature,
            }));
        }

        Ok(())
    }
}

fn postfund_turn(n: usize) -> u64 {
    2 * n as u64 - 1
}

fn destination_for(address: Address) -> Bytes32 {
    let mut buf = [0u8; 32];
    buf[12..].copy_from_slice(&address.0);
    Bytes32(buf)
}

/// Store a received signature into a per-participant slot. A second,
/// identical signature for the same slot is a no-op; a second, differing
/// signature is a conflict.
fn store_signature(
    slot: &mut Option<Signature>,
    signature: Signature,
    objective_id: Bytes32,
    turn_num: u64,
    signer: Address,
) -> Result<(), CrankError> {
    match slot {
        Some(existing) if *existing == signature => Ok(()),
        Some(_) => Err(CrankError::SignatureConflict {
            objective_id,
            turn_num,
            signer,
        }),
        None => {
            *slot = Some(signature);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{Allocation, AllocationType};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// A [`CrankContext`] fake that signs with a fixed recoverable
    /// signature per signer and lets the test script exactly which
    /// address each signature recovers to.
    struct FakeCrankContext {
        my_address: Address,
        my_signature: Signature,
        recoveries: RefCell<HashMap<(Hash, Signature), Address>>,
    }

    impl FakeCrankContext {
        fn new(my_address: Address) -> Self {
            Self {
                my_address,
                my_signature: Signature {
                    r: [0xAA; 32],
                    s: [0xBB; 32],
                    v: 27,
                },
                recoveries: RefCell::new(HashMap::new()),
            }
        }

        fn register(&self, hash: Hash, signature: Signature, signer: Address) {
            self.recoveries.borrow_mut().insert((hash, signature), signer);
        }
    }

    impl CrankContext for FakeCrankContext {
        fn sign(&self, state_hash: Hash) -> Signature {
            self.recoveries
                .borrow_mut()
                .insert((state_hash, self.my_signature), self.my_address);
            self.my_signature
        }

        fn recover_signer(
            &self,
            state_hash: Hash,
            signature: Signature,
        ) -> Result<Address, ValidationError> {
            self.recoveries
                .borrow()
                .get(&(state_hash, signature))
                .copied()
                .ok_or(ValidationError::SignatureInvalid)
        }
    }

    fn two_party_fixed() -> FixedPart {
        FixedPart {
            participants: vec![Address([1u8; 20]), Address([2u8; 20])],
            channel_nonce: 1,
            app_definition: Address([9u8; 20]),
            challenge_duration: 100,
        }
    }

    fn funding_outcome(fixed: &FixedPart) -> Outcome {
        Outcome {
            asset: Address::ZERO,
            allocations: fixed
                .participants
                .iter()
                .map(|p| Allocation {
                    destination: destination_for(*p),
                    amount: 10,
                    asset_type: AllocationType::Simple,
                    metadata: Vec::new(),
                })
                .collect(),
        }
    }

    fn signature_for(tag: u8) -> Signature {
        Signature {
            r: [tag; 32],
            s: [tag; 32],
            v: 27,
        }
    }

    /// Walks through the full two-party happy path from party A's
    /// perspective (index 0), feeding in B's signatures and deposit as
    /// externally observed events.
    #[test]
    fn direct_fund_two_party_happy_path() {
        let fixed = two_party_fixed();
        let outcome = funding_outcome(&fixed);
        let mut a = DirectFundObjective::new(Bytes32([0x11; 32]), 0, fixed.clone(), outcome.clone());
        let ctx = FakeCrankContext::new(fixed.participants[0]);

        let result = a.crank(&ObjectiveEvent::ApprovalGranted, &ctx).unwrap();
        assert_eq!(result.waiting_for, WaitingFor::CompletePrefund);
        assert_eq!(result.side_effects.len(), 1);

        let b_prefund_sig = signature_for(1);
        let prefund_hash = a.prefund_state().hash();
        ctx.register(prefund_hash, b_prefund_sig, fixed.participants[1]);
        let result = a
            .crank(
                &ObjectiveEvent::StateReceived {
                    channel_id: a.channel_id,
                    turn_num: 0,
                    state: a.prefund_state(),
                    signature: b_prefund_sig,
                    from: fixed.participants[1],
                },
                &ctx,
            )
            .unwrap();
        assert_eq!(result.waiting_for, WaitingFor::MyTurnToFund);
        assert_eq!(result.side_effects.len(), 1);
        assert!(matches!(result.side_effects[0], SideEffect::SubmitTx(_)));

        let result = a
            .crank(
                &ObjectiveEvent::DepositDetected {
                    channel_id: a.channel_id,
                    asset: Address::ZERO,
                    amount: 10,
                    depositor: fixed.participants[0],
                },
                &ctx,
            )
            .unwrap();
        assert_eq!(result.waiting_for, WaitingFor::CompleteFunding);
        assert!(result.side_effects.is_empty());

        let result = a
            .crank(
                &ObjectiveEvent::DepositDetected {
                    channel_id: a.channel_id,
                    asset: Address::ZERO,
                    amount: 10,
                    depositor: fixed.participants[1],
                },
                &ctx,
            )
            .unwrap();
        assert_eq!(result.waiting_for, WaitingFor::CompletePostfund);
        assert_eq!(result.side_effects.len(), 1);
        assert!(matches!(result.side_effects[0], SideEffect::SendMessage(_)));

        let b_postfund_sig = signature_for(2);
        let postfund_hash = a.postfund_state().hash();
        ctx.register(postfund_hash, b_postfund_sig, fixed.participants[1]);
        let result = a
            .crank(
                &ObjectiveEvent::StateReceived {
                    channel_id: a.channel_id,
                    turn_num: postfund_turn(2),
                    state: a.postfund_state(),
                    signature: b_postfund_sig,
                    from: fixed.participants[1],
                },
                &ctx,
            )
            .unwrap();
        assert_eq!(result.waiting_for, WaitingFor::Nothing);
        assert_eq!(a.status, DirectFundStatus::Complete);
    }

    #[test]
    fn duplicate_identical_signature_is_idempotent() {
        let fixed = two_party_fixed();
        let outcome = funding_outcome(&fixed);
        let mut a = DirectFundObjective::new(Bytes32([0x22; 32]), 0, fixed.clone(), outcome);
        let ctx = FakeCrankContext::new(fixed.participants[0]);
        a.crank(&ObjectiveEvent::ApprovalGranted, &ctx).unwrap();

        let sig = signature_for(5);
        let hash = a.prefund_state().hash();
        ctx.register(hash, sig, fixed.participants[1]);
        let event = ObjectiveEvent::StateReceived {
            channel_id: a.channel_id,
            turn_num: 0,
            state: a.prefund_state(),
            signature: sig,
            from: fixed.participants[1],
        };
        a.crank(&event, &ctx).unwrap();
        let result = a.crank(&event, &ctx).unwrap();
        assert!(result.side_effects.is_empty() || matches!(result.side_effects[0], SideEffect::SubmitTx(_)));
    }

    #[test]
    fn conflicting_signature_is_rejected() {
        let fixed = two_party_fixed();
        let outcome = funding_outcome(&fixed);
        let mut a = DirectFundObjective::new(Bytes32([0x33; 32]), 0, fixed.clone(), outcome);
        let ctx = FakeCrankContext::new(fixed.participants[0]);
        a.crank(&ObjectiveEvent::ApprovalGranted, &ctx).unwrap();

        let hash = a.prefund_state().hash();
        let sig1 = signature_for(5);
        let sig2 = signature_for(6);
        ctx.register(hash, sig1, fixed.participants[1]);
        ctx.register(hash, sig2, fixed.participants[1]);

        a.crank(
            &ObjectiveEvent::StateReceived {
                channel_id: a.channel_id,
                turn_num: 0,
                state: a.prefund_state(),
                signature: sig1,
                from: fixed.participants[1],
            },
            &ctx,
        )
        .unwrap();

        let err = a
            .crank(
                &ObjectiveEvent::StateReceived {
                    channel_id: a.channel_id,
                    turn_num: 0,
                    state: a.prefund_state(),
                    signature: sig2,
                    from: fixed.participants[1],
                },
                &ctx,
            )
            .unwrap_err();
        assert!(matches!(err, CrankError::SignatureConflict { .. }));
    }

    #[test]
    fn signature_from_non_participant_is_rejected() {
        let fixed = two_party_fixed();
        let outcome = funding_outcome(&fixed);
        let mut a = DirectFundObjective::new(Bytes32([0x44; 32]), 0, fixed.clone(), outcome);
        let ctx = FakeCrankContext::new(fixed.participants[0]);
        a.crank(&ObjectiveEvent::ApprovalGranted, &ctx).unwrap();

        let stranger = Address([0xFF; 20]);
        let hash = a.prefund_state().hash();
        let sig = signature_for(9);
        ctx.register(hash, sig, stranger);

        let err = a
            .crank(
                &ObjectiveEvent::StateReceived {
                    channel_id: a.channel_id,
                    turn_num: 0,
                    state: a.prefund_state(),
                    signature: sig,
                    from: stranger,
                },
                &ctx,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CrankError::Validation(ValidationError::SignerNotParticipant)
        ));
    }

    #[test]
    fn rejection_is_terminal_and_absorbs_further_events() {
        let fixed = two_party_fixed();
        let outcome = funding_outcome(&fixed);
        let mut a = DirectFundObjective::new(Bytes32([0x55; 32]), 0, fixed.clone(), outcome);
        let ctx = FakeCrankContext::new(fixed.participants[0]);
        let result = a
            .crank(
                &ObjectiveEvent::Rejection {
                    reason: "timed out".into(),
                },
                &ctx,
            )
            .unwrap();
        assert_eq!(result.waiting_for, WaitingFor::Nothing);
        assert_eq!(a.status, DirectFundStatus::Rejected);

        let err = a.crank(&ObjectiveEvent::ApprovalGranted, &ctx).unwrap_err();
        assert!(matches!(err, CrankError::AlreadyTerminal(_)));
    }

    #[test]
    fn deposit_ordering_is_respected_for_three_parties() {
        let fixed = FixedPart {
            participants: vec![Address([1u8; 20]), Address([2u8; 20]), Address([3u8; 20])],
            channel_nonce: 1,
            app_definition: Address([9u8; 20]),
            challenge_duration: 100,
        };
        let outcome = funding_outcome(&fixed);
        // Node is participant index 2 (last to deposit).
        let mut node = DirectFundObjective::new(Bytes32([0x66; 32]), 2, fixed.clone(), outcome);
        let ctx = FakeCrankContext::new(fixed.participants[2]);
        node.crank(&ObjectiveEvent::ApprovalGranted, &ctx).unwrap();

        for (i, participant) in fixed.participants.iter().enumerate() {
            let sig = signature_for(10 + i as u8);
            let hash = node.prefund_state().hash();
            ctx.register(hash, sig, *participant);
            if i != 2 {
                node.crank(
                    &ObjectiveEvent::StateReceived {
                        channel_id: node.channel_id,
                        turn_num: 0,
                        state: node.prefund_state(),
                        signature: sig,
                        from: *participant,
                    },
                    &ctx,
                )
                .unwrap();
            }
        }
        assert!(node.all_prefund_signed());
        assert!(!node.my_turn_to_deposit());

        let result = node
            .crank(
                &ObjectiveEvent::DepositDetected {
                    channel_id: node.channel_id,
                    asset: Address::ZERO,
                    amount: 10,
                    depositor: fixed.participants[0],
                },
                &ctx,
            )
            .unwrap();
        assert_eq!(result.waiting_for, WaitingFor::CompleteFunding);
        assert!(result.side_effects.is_empty());

        let result = node
            .crank(
                &ObjectiveEvent::DepositDetected {
                    channel_id: node.channel_id,
                    asset: Address::ZERO,
                    amount: 10,
                    depositor: fixed.participants[1],
                },
                &ctx,
            )
            .unwrap();
        assert_eq!(result.waiting_for, WaitingFor::MyTurnToFund);
        assert_eq!(result.side_effects.len(), 1);
        assert!(matches!(result.side_effects[0], SideEffect::SubmitTx(_)));
    }

    #[test]
    fn state_received_before_approval_is_rejected() {
        let fixed = two_party_fixed();
        let outcome = funding_outcome(&fixed);
        let mut a = DirectFundObjective::new(Bytes32([0x77; 32]), 0, fixed.clone(), outcome);
        let ctx = FakeCrankContext::new(fixed.participants[0]);

        let sig = signature_for(1);
        let hash = a.prefund_state().hash();
        ctx.register(hash, sig, fixed.participants[1]);
        let err = a
            .crank(
                &ObjectiveEvent::StateReceived {
                    channel_id: a.channel_id,
                    turn_num: 0,
                    state: a.prefund_state(),
                    signature: sig,
                    from: fixed.participants[1],
                },
                &ctx,
            )
            .unwrap_err();
        assert!(matches!(err, CrankError::PreconditionNotMet { .. }));
    }

    #[test]
    fn deposit_before_prefund_consensus_is_rejected() {
        let fixed = two_party_fixed();
        let outcome = funding_outcome(&fixed);
        let mut a = DirectFundObjective::new(Bytes32([0x88; 32]), 0, fixed.clone(), outcome);
        let ctx = FakeCrankContext::new(fixed.participants[0]);
        a.crank(&ObjectiveEvent::ApprovalGranted, &ctx).unwrap();

        let err = a
            .crank(
                &ObjectiveEvent::DepositDetected {
                    channel_id: a.channel_id,
                    asset: Address::ZERO,
                    amount: 10,
                    depositor: fixed.participants[0],
                },
                &ctx,
            )
            .unwrap_err();
        assert!(matches!(err, CrankError::PreconditionNotMet { .. }));
    }

    #[test]
    fn postfund_signature_before_deposits_complete_is_rejected() {
        let fixed = two_party_fixed();
        let outcome = funding_outcome(&fixed);
        let mut a = DirectFundObjective::new(Bytes32([0x99; 32]), 0, fixed.clone(), outcome);
        let ctx = FakeCrankContext::new(fixed.participants[0]);
        a.crank(&ObjectiveEvent::ApprovalGranted, &ctx).unwrap();

        let b_prefund_sig = signature_for(1);
        let prefund_hash = a.prefund_state().hash();
        ctx.register(prefund_hash, b_prefund_sig, fixed.participants[1]);
        a.crank(
            &ObjectiveEvent::StateReceived {
                channel_id: a.channel_id,
                turn_num: 0,
                state: a.prefund_state(),
                signature: b_prefund_sig,
                from: fixed.participants[1],
            },
            &ctx,
        )
        .unwrap();

        let b_postfund_sig = signature_for(2);
        let postfund_hash = a.postfund_state().hash();
        ctx.register(postfund_hash, b_postfund_sig, fixed.participants[1]);
        let err = a
            .crank(
                &ObjectiveEvent::StateReceived {
                    channel_id: a.channel_id,
                    turn_num: postfund_turn(2),
                    state: a.postfund_state(),
                    signature: b_postfund_sig,
                    from: fixed.participants[1],
                },
                &ctx,
            )
            .unwrap_err();
        assert!(matches!(err, CrankError::PreconditionNotMet { .. }));
    }
}
