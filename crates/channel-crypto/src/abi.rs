//! Ethereum `abi.encodePacked`-style packed encoding.
//!
//! Implemented directly rather than pulled in as a dependency: the
//! encoding rules are narrow, fixed, and arithmetic rather than parsing.
//! Big-endian, right-aligned fixed-width integers and raw concatenation
//! for addresses/arrays.

use channel_types::Address;

/// One packed-encodable value. Dynamic arrays of [`PackedValue::Address`]
/// are represented by repeated pushes, not a dedicated array variant,
/// matching `abi.encodePacked`'s flat concatenation semantics.
#[derive(Debug, Clone)]
pub enum PackedValue {
    /// A 20-byte address, encoded as its 20 raw bytes.
    Address(Address),
    /// An unsigned integer, encoded big-endian right-aligned in `width`
    /// bytes. `width` must be large enough to hold the value; this is an
    /// internal invariant of the caller, not externally validated.
    Uint { value: u128, width: usize },
    /// A single raw byte (e.g. a boolean or type tag).
    Byte(u8),
    /// A raw byte string, encoded as-is with no length prefix (the dynamic
    /// part of `abi.encodePacked` for `bytes`).
    Bytes(Vec<u8>),
    /// A fixed 32-byte value, encoded as-is.
    Fixed32([u8; 32]),
}

/// Encode a sequence of values per Ethereum's `abi.encodePacked` convention:
/// values are concatenated with no padding between them, each integer
/// serialized big-endian in its declared width, addresses as 20 raw bytes.
pub fn encode_packed(values: &[PackedValue]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in values {
        match value {
            PackedValue::Address(addr) => out.extend_from_slice(&addr.0),
            PackedValue::Byte(b) => out.push(*b),
            PackedValue::Bytes(bytes) => out.extend_from_slice(bytes),
            PackedValue::Fixed32(bytes) => out.extend_from_slice(bytes),
            PackedValue::Uint { value, width } => {
                let full = value.to_be_bytes();
                out.extend_from_slice(&full[full.len() - width..]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_raw_20_bytes() {
        let addr = Address([0xAAu8; 20]);
        let packed = encode_packed(&[PackedValue::Address(addr)]);
        assert_eq!(packed, vec![0xAAu8; 20]);
    }

    #[test]
    fn uint_is_big_endian_right_aligned() {
        let packed = encode_packed(&[PackedValue::Uint {
            value: 0x01_02,
            width: 4,
        }]);
        assert_eq!(packed, vec![0x00, 0x00, 0x01, 0x02]);
    }

    #[test]
    fn concatenation_preserves_order_with_no_padding() {
        let a = Address([0x11u8; 20]);
        let packed = encode_packed(&[
            PackedValue::Address(a),
            PackedValue::Uint { value: 7, width: 8 },
        ]);
        assert_eq!(packed.len(), 20 + 8);
        assert_eq!(&packed[..20], &[0x11u8; 20]);
        assert_eq!(&packed[20..], &7u64.to_be_bytes());
    }

    #[test]
    fn order_and_every_field_affects_result() {
        let a = Address([0x01u8; 20]);
        let b = Address([0x02u8; 20]);
        let ab = encode_packed(&[PackedValue::Address(a), PackedValue::Address(b)]);
        let ba = encode_packed(&[PackedValue::Address(b), PackedValue::Address(a)]);
        assert_ne!(ab, ba);
    }
}
