//! Ethereum-style recoverable secp256k1 ECDSA: `k256` for the curve
//! arithmetic, `sha3::Keccak256` for digests, recovery id folded into a
//! `v` byte of 27 or 28, and signer recovery resolved to a 20-byte
//! Ethereum-style address rather than a raw public key.

use crate::errors::CryptoError;
use crate::keccak::keccak256;
use channel_types::{Address, Hash, Signature};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};

/// Sign a 32-byte digest with a secp256k1 private key, returning an
/// Ethereum-style recoverable [`Signature`] with low-S normalization.
pub fn sign(digest: &Hash, signing_key: &SigningKey) -> Signature {
    let (sig, recid): (K256Signature, RecoveryId) = signing_key
        .sign_prehash_recoverable(&digest.0)
        .expect("signing a 32-byte digest cannot fail");

    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);

    Signature {
        r,
        s,
        v: recid.to_byte() + 27,
    }
}

/// Recover the signer's 20-byte Ethereum address from a signature over a
/// 32-byte digest.
pub fn recover_address(digest: &Hash, signature: &Signature) -> Result<Address, CryptoError> {
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = K256Signature::from_slice(&sig_bytes).map_err(|_| CryptoError::InvalidFormat)?;

    let recovered = VerifyingKey::recover_from_prehash(&digest.0, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_from_verifying_key(&recovered))
}

/// Derive the 20-byte Ethereum address for a secp256k1 public key:
/// the low 20 bytes of `keccak256(uncompressed_pubkey[1..])`.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    let pubkey_bytes = encoded.as_bytes();
    let hash = keccak256(&pubkey_bytes[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash.0[12..]);
    Address::from(out)
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, CryptoError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        other => return Err(CryptoError::InvalidRecoveryId(other)),
    };
    RecoveryId::try_from(id).map_err(|_| CryptoError::InvalidRecoveryId(v))
}
