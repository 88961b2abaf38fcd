//! Keccak-256 hashing.

use channel_types::Hash;
use sha3::{Digest, Keccak256};

/// Hash arbitrary bytes with Keccak-256.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Hash::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_vector() {
        // Keccak-256("") = c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a47
        let got = keccak256(b"");
        assert_eq!(
            hex::encode(got.0),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a47"
        );
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(keccak256(b"hello"), keccak256(b"hello"));
        assert_ne!(keccak256(b"hello"), keccak256(b"world"));
    }
}
