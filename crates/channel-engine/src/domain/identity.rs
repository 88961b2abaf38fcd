//! Canonical encoding and content-addressed identity.
//!
//! Canonicalization is delegated to `serde_json::Value`: its `Map` is
//! `BTreeMap`-backed whenever the `preserve_order` feature is off (it is,
//! nowhere in this workspace), so `to_value` followed by `to_vec` yields
//! object keys in lexicographic order, no insignificant whitespace, and
//! decimal integers with no fractional form, without hand-rolling a
//! JSON writer.

use channel_crypto::{encode_packed, keccak256, PackedValue};
use channel_types::{CanonicalizationError, EventId, Hash};
use serde::Serialize;

use crate::domain::event::{FixedPart, State};

/// Domain separation tag prepended to every event id hash input. Part of
/// the wire contract; changing it requires bumping `event_version`
/// globally.
pub const EVENT_ID_DOMAIN_TAG: &str = "ev1";

/// Render `payload` into its canonical byte form: object keys sorted in
/// UTF-8 codepoint order, no insignificant whitespace, integers as plain
/// decimal, minimal string escapes.
pub fn canonical_bytes<T: Serialize>(payload: &T) -> Result<Vec<u8>, CanonicalizationError> {
    let value =
        serde_json::to_value(payload).map_err(|_| CanonicalizationError::InvalidPayload)?;
    serde_json::to_vec(&value).map_err(|_| CanonicalizationError::InvalidPayload)
}

/// Compute the content-addressed id of an event: `Keccak256("ev1|" ++
/// name ++ "|" ++ canonical_bytes(payload))`.
pub fn event_id<T: Serialize>(name: &str, payload: &T) -> Result<EventId, CanonicalizationError> {
    let canonical = canonical_bytes(payload)?;
    let mut preimage = Vec::with_capacity(EVENT_ID_DOMAIN_TAG.len() + 1 + name.len() + 1 + canonical.len());
    preimage.extend_from_slice(EVENT_ID_DOMAIN_TAG.as_bytes());
    preimage.push(b'|');
    preimage.extend_from_slice(name.as_bytes());
    preimage.push(b'|');
    preimage.extend_from_slice(&canonical);
    Ok(keccak256(&preimage))
}

/// Derive a channel's id from its immutable parameters:
/// `Keccak256(abi.encodePacked(participants) ||
/// abi.encodePacked(nonce, app_definition, challenge_duration))`.
pub fn channel_id(fixed: &FixedPart) -> Hash {
    let mut values: Vec<PackedValue> = fixed
        .participants
        .iter()
        .map(|p| PackedValue::Address(*p))
        .collect();
    values.push(PackedValue::Uint {
        value: fixed.channel_nonce as u128,
        width: 8,
    });
    values.push(PackedValue::Address(fixed.app_definition));
    values.push(PackedValue::Uint {
        value: fixed.challenge_duration as u128,
        width: 4,
    });
    keccak256(&encode_packed(&values))
}

/// Compute the Keccak-256 hash of the packed encoding of a full state
/// (FixedPart ∪ VariablePart), in the fixed field order: participants,
/// nonce, app definition, challenge duration, app data, outcome, turn
/// number, is_final.
pub fn state_hash(state: &State) -> Hash {
    let mut values: Vec<PackedValue> = state
        .fixed
        .participants
        .iter()
        .map(|p| PackedValue::Address(*p))
        .collect();
    values.push(PackedValue::Uint {
        value: state.fixed.channel_nonce as u128,
        width: 8,
    });
    values.push(PackedValue::Address(state.fixed.app_definition));
    values.push(PackedValue::Uint {
        value: state.fixed.challenge_duration as u128,
        width: 4,
    });
    values.push(PackedValue::Bytes(state.variable.app_data.clone()));
    for allocation in &state.variable.outcome.allocations {
        values.push(PackedValue::Fixed32(allocation.destination.0));
        values.push(PackedValue::Uint {
            value: allocation.amount,
            width: 32,
        });
        values.push(PackedValue::Byte(allocation.asset_type as u8));
    }
    values.push(PackedValue::Address(state.variable.outcome.asset));
    values.push(PackedValue::Uint {
        value: state.variable.turn_num as u128,
        width: 8,
    });
    values.push(PackedValue::Byte(state.variable.is_final as u8));
    keccak256(&encode_packed(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_types::Address;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        turn_num: u64,
        channel_id: String,
        event_version: u8,
    }

    #[test]
    fn canonical_bytes_sorts_keys_regardless_of_struct_field_order() {
        let a = canonical_bytes(&Payload {
            turn_num: 5,
            channel_id: "0x1234".to_string(),
            event_version: 1,
        })
        .unwrap();
        let b = canonical_bytes(&json!({
            "event_version": 1,
            "turn_num": 5,
            "channel_id": "0x1234",
        }))
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(
            String::from_utf8(a).unwrap(),
            r#"{"channel_id":"0x1234","event_version":1,"turn_num":5}"#
        );
    }

    #[test]
    fn event_id_is_stable_across_field_order() {
        let p1 = json!({"a": 1, "b": 2});
        let p2 = json!({"b": 2, "a": 1});
        assert_eq!(
            event_id("state-signed", &p1).unwrap(),
            event_id("state-signed", &p2).unwrap()
        );
    }

    #[test]
    fn event_id_changes_with_variant_name() {
        let p = json!({"a": 1});
        assert_ne!(
            event_id("state-signed", &p).unwrap(),
            event_id("state-received", &p).unwrap()
        );
    }

    fn sample_fixed() -> FixedPart {
        FixedPart {
            participants: vec![Address([1u8; 20]), Address([2u8; 20])],
            channel_nonce: 7,
            app_definition: Address([3u8; 20]),
            challenge_duration: 86_400,
        }
    }

    #[test]
    fn channel_id_same_fixed_part_same_id() {
        assert_eq!(channel_id(&sample_fixed()), channel_id(&sample_fixed()));
    }

    #[test]
    fn channel_id_order_and_every_field_affects_result() {
        let base = sample_fixed();
        let mut reordered = base.clone();
        reordered.participants.reverse();
        assert_ne!(channel_id(&base), channel_id(&reordered));

        let mut different_nonce = base.clone();
        different_nonce.channel_nonce += 1;
        assert_ne!(channel_id(&base), channel_id(&different_nonce));

        let mut different_duration = base.clone();
        different_duration.challenge_duration += 1;
        assert_ne!(channel_id(&base), channel_id(&different_duration));
    }
}
