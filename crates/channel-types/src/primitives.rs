//! Primitive value types shared by every component of the channel engine.
//!
//! Plain fixed-size byte arrays wrapped in newtypes, with `Display`/`Debug`
//! rendered as `0x`-prefixed lowercase hex for readable logs and errors.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! fixed_bytes_type {
    ($name:ident, $len:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// All-zero value.
            pub const ZERO: Self = Self([0u8; $len]);

            /// Build from a byte slice, failing if the length doesn't match.
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                if bytes.len() != $len {
                    return None;
                }
                let mut buf = [0u8; $len];
                buf.copy_from_slice(bytes);
                Some(Self(buf))
            }

            /// Borrow the underlying bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ZERO
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{})", stringify!($name), hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }
    };
}

fixed_bytes_type!(Address, 20, "A 20-byte Ethereum-style address.");
fixed_bytes_type!(Bytes32, 32, "A 32-byte hash or identifier.");

/// A 32-byte Keccak-256 hash. Distinct alias from [`Bytes32`] for call-site clarity.
pub type Hash = Bytes32;

/// A 32-byte content-addressed event identifier.
pub type EventId = Bytes32;

/// A monotonically increasing, dense, non-negative log position.
pub type EventOffset = u64;

/// An Ethereum-style recoverable ECDSA signature: `r` (32 bytes), `s` (32
/// bytes), `v` (1 byte, 27 or 28).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// R component.
    pub r: [u8; 32],
    /// S component.
    pub s: [u8; 32],
    /// Recovery byte, 27 or 28.
    pub v: u8,
}

impl Signature {
    /// Serialize as the 65-byte `r || s || v` wire representation.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Parse from the 65-byte `r || s || v` wire representation.
    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self { r, s, v: bytes[64] }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{})", hex::encode(self.to_bytes()))
    }
}
