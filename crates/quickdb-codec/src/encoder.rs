//! Metadata-driven encoder
//!
//! Converts host values (JSON) into tagged values, enforcing the declared field
//! type. Encoding is all-or-nothing: the first failure aborts the whole field
//! (or record) and no partial result is returned.

use crate::config::{ArrayItemMode, EncodeOptions};
use crate::context::FieldPath;
use crate::formats;
use crate::schema::{FieldDefinition, FieldType, ModelMeta};
use crate::value::{host_type_name, TaggedRecord, TaggedValue};
use quickdb_common::{QuickDbError, Result};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use tracing::trace;

// ============================================================================
// Public API
// ============================================================================

/// Encode one field value against its metadata
///
/// # Example
///
/// ```
/// use quickdb_codec::{encode, FieldDefinition, TaggedValue};
/// use serde_json::json;
///
/// let tagged = encode(&json!(42), "age", &FieldDefinition::integer()).unwrap();
/// assert_eq!(tagged, TaggedValue::Int(42));
///
/// assert!(encode(&json!("42"), "age", &FieldDefinition::integer()).is_err());
/// ```
pub fn encode(value: &JsonValue, field_name: &str, field: &FieldDefinition) -> Result<TaggedValue> {
    encode_with_options(value, field_name, field, &EncodeOptions::default())
}

/// Encode one field value with explicit encoder options
pub fn encode_with_options(
    value: &JsonValue,
    field_name: &str,
    field: &FieldDefinition,
    options: &EncodeOptions,
) -> Result<TaggedValue> {
    let mut path = FieldPath::root(field_name);
    encode_value(value, &field.field_type, &mut path, options)
}

/// Encode every member of a host record against the model's field metadata
///
/// A member without field metadata fails with a `Metadata` error.
pub fn encode_record(data: &Map<String, JsonValue>, meta: &ModelMeta) -> Result<TaggedRecord> {
    encode_record_with_options(data, meta, &EncodeOptions::default())
}

/// Encode a host record with explicit encoder options
pub fn encode_record_with_options(
    data: &Map<String, JsonValue>,
    meta: &ModelMeta,
    options: &EncodeOptions,
) -> Result<TaggedRecord> {
    trace!(
        collection = %meta.collection_name,
        fields = data.len(),
        "encoding record"
    );
    let mut record = TaggedRecord::new();
    for (name, value) in data {
        let field = meta.field(name).ok_or_else(|| {
            QuickDbError::metadata(
                name.clone(),
                format!("no field metadata on model '{}'", meta.collection_name),
            )
        })?;
        record.push(name.clone(), encode_with_options(value, name, field, options)?);
    }
    Ok(record)
}

// ============================================================================
// Core Encoding Function
// ============================================================================

/// Encode a value against a declared type, tracking the nested location in `path`
pub fn encode_value(
    value: &JsonValue,
    field_type: &FieldType,
    path: &mut FieldPath,
    options: &EncodeOptions,
) -> Result<TaggedValue> {
    if value.is_null() {
        return Ok(TaggedValue::Null);
    }

    match field_type {
        FieldType::String { .. } | FieldType::Text | FieldType::Reference { .. } => {
            Ok(TaggedValue::String(stringify(value)))
        }
        FieldType::Integer { .. } => encode_integer(value, path),
        FieldType::Float { .. } => encode_float(value, path),
        FieldType::Boolean => match value {
            JsonValue::Bool(b) => Ok(TaggedValue::Bool(*b)),
            other => Err(mismatch(path, "boolean", other)),
        },
        FieldType::DateTime => encode_datetime(value, path),
        FieldType::Uuid => encode_uuid(value, path),
        FieldType::Json => Ok(encode_json(value)),
        FieldType::Array { item_type, .. } => encode_array(value, item_type, path, options),
        FieldType::Object { fields } => encode_object(value, fields, path, options),
    }
}

// ============================================================================
// Scalar Types
// ============================================================================

fn encode_integer(value: &JsonValue, path: &FieldPath) -> Result<TaggedValue> {
    match value {
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(TaggedValue::Int(i)),
            None if n.is_u64() => Err(QuickDbError::type_mismatch(
                path.current(),
                "integer",
                "integer outside the 64-bit signed range",
            )),
            None => Err(mismatch(path, "integer", value)),
        },
        other => Err(mismatch(path, "integer", other)),
    }
}

fn encode_float(value: &JsonValue, path: &FieldPath) -> Result<TaggedValue> {
    match value.as_f64() {
        Some(f) => Ok(TaggedValue::Float(f)),
        None => Err(mismatch(path, "float", value)),
    }
}

fn encode_datetime(value: &JsonValue, path: &FieldPath) -> Result<TaggedValue> {
    match value {
        JsonValue::String(s) if formats::validate_datetime(s) => {
            Ok(TaggedValue::DateTime(s.clone()))
        }
        JsonValue::String(s) => Err(QuickDbError::format(
            path.current(),
            "datetime (ISO 8601)",
            s.clone(),
        )),
        other => Err(mismatch(path, "string", other)),
    }
}

fn encode_uuid(value: &JsonValue, path: &FieldPath) -> Result<TaggedValue> {
    match value {
        // Empty text asks the engine to generate the identifier
        JsonValue::String(s) if s.is_empty() => Ok(TaggedValue::String(String::new())),
        JsonValue::String(s) if formats::validate_uuid(s) => Ok(TaggedValue::Uuid(s.clone())),
        JsonValue::String(s) => Err(QuickDbError::format(path.current(), "UUID", s.clone())),
        other => Err(mismatch(path, "string", other)),
    }
}

// ============================================================================
// Structured Types
// ============================================================================

/// Json fields recurse with the same Json metadata at every level
fn encode_json(value: &JsonValue) -> TaggedValue {
    match value {
        JsonValue::Object(map) => TaggedValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode_json(v)))
                .collect(),
        ),
        JsonValue::Array(items) => TaggedValue::Array(items.iter().map(encode_json).collect()),
        JsonValue::String(s) => TaggedValue::String(s.clone()),
        JsonValue::Bool(b) => TaggedValue::Bool(*b),
        JsonValue::Null => TaggedValue::Null,
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => TaggedValue::Int(i),
            (None, Some(f)) if !n.is_u64() => TaggedValue::Float(f),
            _ => TaggedValue::String(n.to_string()),
        },
    }
}

fn encode_array(
    value: &JsonValue,
    item_type: &FieldType,
    path: &mut FieldPath,
    options: &EncodeOptions,
) -> Result<TaggedValue> {
    let items = match value {
        JsonValue::Array(items) => items,
        other => return Err(mismatch(path, "array", other)),
    };

    match options.array_items {
        ArrayItemMode::Sniff => Ok(TaggedValue::Array(items.iter().map(sniff).collect())),
        ArrayItemMode::Declared => {
            let mut encoded = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push_index(i);
                let result = encode_value(item, item_type, path, options);
                path.pop();
                encoded.push(result?);
            }
            Ok(TaggedValue::Array(encoded))
        }
    }
}

/// Coarse tag from the element's own host type
fn sniff(item: &JsonValue) -> TaggedValue {
    match item {
        JsonValue::String(s) => TaggedValue::String(s.clone()),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => TaggedValue::Int(i),
            None => TaggedValue::String(n.to_string()),
        },
        JsonValue::Bool(b) => TaggedValue::Bool(*b),
        JsonValue::Null => TaggedValue::Null,
        other => TaggedValue::String(stringify(other)),
    }
}

fn encode_object(
    value: &JsonValue,
    fields: &BTreeMap<String, FieldDefinition>,
    path: &mut FieldPath,
    options: &EncodeOptions,
) -> Result<TaggedValue> {
    let map = match value {
        JsonValue::Object(map) => map,
        other => return Err(mismatch(path, "object", other)),
    };

    let mut entries = Vec::with_capacity(map.len());
    for (key, member) in map {
        let Some(field) = fields.get(key) else {
            return Err(QuickDbError::metadata(
                path.child(key),
                "no field metadata declared for this key",
            ));
        };
        path.push(key);
        let result = encode_value(member, &field.field_type, path, options);
        path.pop();
        entries.push((key.clone(), result?));
    }
    Ok(TaggedValue::Object(entries))
}

// ============================================================================
// Helpers
// ============================================================================

/// String conversion: text verbatim, anything else as compact JSON text
fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn mismatch(path: &FieldPath, expected: &str, actual: &JsonValue) -> QuickDbError {
    QuickDbError::type_mismatch(path.current(), expected, host_type_name(actual))
}
