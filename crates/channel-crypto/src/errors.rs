//! Cryptographic operation errors.

use thiserror::Error;

/// Errors raised while recovering or verifying a secp256k1 signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The `v` byte was not one of the two valid recovery ids (27, 28).
    #[error("invalid recovery id: {0} (expected 27 or 28)")]
    InvalidRecoveryId(u8),
    /// `r`/`s` did not parse into a valid secp256k1 signature.
    #[error("malformed signature")]
    InvalidFormat,
    /// Public key recovery failed for an otherwise well-formed signature.
    #[error("signature recovery failed")]
    RecoveryFailed,
}
