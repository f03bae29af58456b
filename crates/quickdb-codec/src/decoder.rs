//! Tagged value decoder
//!
//! Turns engine output back into host values. Decoding is total: any JSON
//! input produces a host value. Mappings that are not a single known tag keep
//! their keys and have their values decoded.

use crate::value::TaggedValue;
use serde_json::{Map, Value as JsonValue};

/// Decode tagged JSON into a host value
///
/// # Example
///
/// ```
/// use quickdb_codec::decode;
/// use serde_json::json;
///
/// let host = decode(&json!({"Object": {
///     "name": {"String": "alice"},
///     "tags": {"Array": [{"String": "a"}, {"Int": 2}]}
/// }}));
/// assert_eq!(host, json!({"name": "alice", "tags": ["a", 2]}));
/// ```
pub fn decode(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => decode_mapping(map),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(decode).collect()),
        scalar => scalar.clone(),
    }
}

fn decode_mapping(map: &Map<String, JsonValue>) -> JsonValue {
    if map.len() == 1 {
        if let Some((tag, payload)) = map.iter().next() {
            if TaggedValue::is_tag(tag) {
                return decode_payload(tag, payload);
            }
        }
    }

    // Records, and single keys that are not tags, keep their keys
    JsonValue::Object(map.iter().map(|(k, v)| (k.clone(), decode(v))).collect())
}

fn decode_payload(tag: &str, payload: &JsonValue) -> JsonValue {
    match (tag, payload) {
        ("Null", _) => JsonValue::Null,
        ("Object", JsonValue::Object(fields)) => JsonValue::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), decode(v)))
                .collect(),
        ),
        ("Array", JsonValue::Array(items)) => JsonValue::Array(items.iter().map(decode).collect()),
        (_, JsonValue::Object(_)) | (_, JsonValue::Array(_)) => decode(payload),
        (_, scalar) => scalar.clone(),
    }
}
