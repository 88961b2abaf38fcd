//! A [`CrankContext`] backed by a real secp256k1 signing key, bridging
//! the objective engine to `channel-crypto`.

use channel_crypto::{recover_address, sign};
use channel_types::{Address, Hash, Signature, ValidationError};
use k256::ecdsa::SigningKey;

use crate::domain::objective::CrankContext;

/// Signs with a locally held secp256k1 key and recovers signers via
/// Ethereum-style address recovery.
pub struct Secp256k1CrankContext {
    signing_key: SigningKey,
}

impl Secp256k1CrankContext {
    /// Build a context that signs with `signing_key`.
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// This context's signer address.
    pub fn address(&self) -> Address {
        channel_crypto::address_from_verifying_key(self.signing_key.verifying_key())
    }
}

impl CrankContext for Secp256k1CrankContext {
    fn sign(&self, state_hash: Hash) -> Signature {
        sign(&state_hash, &self.signing_key)
    }

    fn recover_signer(&self, state_hash: Hash, signature: Signature) -> Result<Address, ValidationError> {
        recover_address(&state_hash, &signature).map_err(|_| ValidationError::SignatureInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_crypto::keccak256;
    use rand::rngs::OsRng;

    #[test]
    fn signs_and_recovers_its_own_address() {
        let ctx = Secp256k1CrankContext::new(SigningKey::random(&mut OsRng));
        let hash = keccak256(b"prefund state");
        let signature = ctx.sign(hash);
        let recovered = ctx.recover_signer(hash, signature).unwrap();
        assert_eq!(recovered, ctx.address());
    }
}
