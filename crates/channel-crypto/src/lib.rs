//! # channel-crypto
//!
//! Cryptographic primitives consumed by the channel engine: Keccak-256
//! hashing, Ethereum-style recoverable secp256k1 ECDSA, and
//! `abi.encodePacked`-style packed encoding.

#![warn(missing_docs)]

pub mod abi;
pub mod ecdsa;
pub mod errors;
pub mod keccak;

pub use abi::{encode_packed, PackedValue};
pub use ecdsa::{address_from_verifying_key, recover_address, sign};
pub use errors::CryptoError;
pub use keccak::keccak256;
