//! A [`ValidationContext`] backed by the reconstructor and the raw log: a
//! lightweight read-only view backed by the reconstructor.

use std::sync::Arc;

use channel_types::{Address, Bytes32, Hash, Signature, ValidationError};

use crate::domain::event::Event;
use crate::domain::reconstruct::{ObjectiveStatus, StateReconstructor};
use crate::ports::store::EventStore;
use crate::ports::validation::ValidationContext;

/// Answers existence and signing-history queries by reconstructing
/// current state and, for signing history, scanning the raw log. The
/// scan is linear in log length; callers that validate many events
/// against a large log should wrap this in their own cache.
pub struct ReconstructorValidationContext {
    reconstructor: Arc<StateReconstructor>,
    store: Arc<dyn EventStore>,
}

impl ReconstructorValidationContext {
    /// Build a context over a reconstructor and the store it reads from.
    pub fn new(reconstructor: Arc<StateReconstructor>, store: Arc<dyn EventStore>) -> Self {
        Self {
            reconstructor,
            store,
        }
    }
}

impl ValidationContext for ReconstructorValidationContext {
    fn objective_exists(&self, id: Bytes32) -> bool {
        self.reconstructor.reconstruct_objective(id).is_ok()
    }

    fn objective_status(&self, id: Bytes32) -> Option<ObjectiveStatus> {
        self.reconstructor
            .reconstruct_objective(id)
            .ok()
            .map(|state| state.status)
    }

    fn channel_exists(&self, id: Bytes32) -> bool {
        self.reconstructor.reconstruct_channel(id).is_ok()
    }

    fn channel_participants(&self, id: Bytes32) -> Option<Vec<Address>> {
        self.reconstructor
            .reconstruct_channel(id)
            .ok()
            .map(|state| state.participants)
    }

    fn last_turn_for_signer(&self, channel_id: Bytes32, signer: Address) -> Option<u64> {
        self.store
            .read_all()
            .iter()
            .filter_map(|event| match event.as_ref() {
                Event::StateSigned(p) if p.channel_id == channel_id && p.signer == signer => {
                    Some(p.turn_num)
                }
                Event::StateReceived(p) if p.channel_id == channel_id && p.signer == signer => {
                    Some(p.turn_num)
                }
                _ => None,
            })
            .max()
    }

    fn final_signers_at(&self, channel_id: Bytes32, turn_num: u64, state_hash: Hash) -> Vec<Address> {
        let mut signers: Vec<Address> = self
            .store
            .read_all()
            .iter()
            .filter_map(|event| match event.as_ref() {
                Event::StateSigned(p)
                    if p.channel_id == channel_id
                        && p.turn_num == turn_num
                        && p.state_hash == state_hash
                        && p.is_final =>
                {
                    Some(p.signer)
                }
                Event::StateReceived(p)
                    if p.channel_id == channel_id
                        && p.turn_num == turn_num
                        && p.state_hash == state_hash
                        && p.is_final =>
                {
                    Some(p.signer)
                }
                _ => None,
            })
            .collect();
        signers.sort_unstable();
        signers.dedup();
        signers
    }

    fn last_challenge_turn_record(&self, channel_id: Bytes32) -> Option<u64> {
        self.store
            .read_all()
            .iter()
            .filter_map(|event| match event.as_ref() {
                Event::ChallengeRegistered(p) if p.channel_id == channel_id => {
                    Some(p.turn_num_record)
                }
                _ => None,
            })
            .last()
    }

    fn recover_signer(
        &self,
        state_hash: Hash,
        signature: Signature,
    ) -> Result<Address, ValidationError> {
        channel_crypto::recover_address(&state_hash, &signature)
            .map_err(|_| ValidationError::SignatureInvalid)
    }
}
