//! Constraint checks for encoded values
//!
//! The encoder only enforces declared types. Bounds declared in field metadata
//! (string length and pattern, numeric range, array item counts, required
//! fields) are checked here, against the already tagged value.

use crate::context::FieldPath;
use crate::schema::{FieldDefinition, FieldType, ModelMeta};
use crate::value::{TaggedRecord, TaggedValue};
use quickdb_common::{QuickDbError, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// Check one tagged value against the bounds of its field metadata
pub fn validate_field(value: &TaggedValue, field_name: &str, field: &FieldDefinition) -> Result<()> {
    let mut path = FieldPath::root(field_name);
    validate_value(value, field, &mut path)
}

/// Check a tagged record against its model
///
/// Required fields that are absent and have no default fail, as does any
/// present field violating its bounds.
pub fn validate_record(record: &TaggedRecord, meta: &ModelMeta) -> Result<()> {
    for (name, field) in &meta.fields {
        if field.required && field.default.is_none() && record.get(name).is_none() {
            return Err(QuickDbError::validation(name.clone(), "Field required"));
        }
    }

    for (name, value) in record.iter() {
        let field = meta.field(name).ok_or_else(|| {
            QuickDbError::metadata(
                name,
                format!("no field metadata on model '{}'", meta.collection_name),
            )
        })?;
        validate_field(value, name, field)?;
    }
    Ok(())
}

fn validate_value(value: &TaggedValue, field: &FieldDefinition, path: &mut FieldPath) -> Result<()> {
    if value.is_null() {
        if field.required {
            return Err(QuickDbError::validation(path.current(), "Field required"));
        }
        return Ok(());
    }

    match (&field.field_type, value) {
        (
            FieldType::String {
                max_length,
                min_length,
                regex,
            },
            TaggedValue::String(s),
        ) => validate_string(s, *min_length, *max_length, regex.as_deref(), path),
        (
            FieldType::Integer {
                min_value,
                max_value,
            },
            TaggedValue::Int(n),
        ) => validate_range(*n, *min_value, *max_value, path),
        (
            FieldType::Float {
                min_value,
                max_value,
            },
            TaggedValue::Float(f),
        ) => validate_range(*f, *min_value, *max_value, path),
        (
            FieldType::Array {
                max_items,
                min_items,
                ..
            },
            TaggedValue::Array(items),
        ) => validate_items(items.len(), *min_items, *max_items, path),
        (FieldType::Object { fields }, TaggedValue::Object(entries)) => {
            validate_object(entries, fields, path)
        }
        // Type agreement is settled by the encoder
        _ => Ok(()),
    }
}

// ============================================================================
// String Validation
// ============================================================================

fn validate_string(
    s: &str,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<&str>,
    path: &FieldPath,
) -> Result<()> {
    // Length in characters, not bytes
    let char_count = s.chars().count();

    if let Some(min) = min_length {
        if char_count < min {
            return Err(QuickDbError::validation(
                path.current(),
                format!("String must be at least {} characters (got {})", min, char_count),
            ));
        }
    }

    if let Some(max) = max_length {
        if char_count > max {
            return Err(QuickDbError::validation(
                path.current(),
                format!("String must be at most {} characters (got {})", max, char_count),
            ));
        }
    }

    if let Some(pattern) = pattern {
        let re = Regex::new(pattern).map_err(|e| {
            QuickDbError::metadata(path.current(), format!("invalid regex pattern: {}", e))
        })?;
        if !re.is_match(s) {
            return Err(QuickDbError::validation(
                path.current(),
                format!("String does not match pattern: {}", pattern),
            ));
        }
    }

    Ok(())
}

// ============================================================================
// Numeric Validation
// ============================================================================

fn validate_range<T>(n: T, min: Option<T>, max: Option<T>, path: &FieldPath) -> Result<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if let Some(min) = min {
        if n < min {
            return Err(QuickDbError::validation(
                path.current(),
                format!("Value must be >= {} (got {})", min, n),
            ));
        }
    }
    if let Some(max) = max {
        if n > max {
            return Err(QuickDbError::validation(
                path.current(),
                format!("Value must be <= {} (got {})", max, n),
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Composite Validation
// ============================================================================

fn validate_items(
    len: usize,
    min_items: Option<usize>,
    max_items: Option<usize>,
    path: &FieldPath,
) -> Result<()> {
    if let Some(min) = min_items {
        if len < min {
            return Err(QuickDbError::validation(
                path.current(),
                format!("Array must have at least {} items (got {})", min, len),
            ));
        }
    }
    if let Some(max) = max_items {
        if len > max {
            return Err(QuickDbError::validation(
                path.current(),
                format!("Array must have at most {} items (got {})", max, len),
            ));
        }
    }
    Ok(())
}

fn validate_object(
    entries: &[(String, TaggedValue)],
    fields: &BTreeMap<String, FieldDefinition>,
    path: &mut FieldPath,
) -> Result<()> {
    for (name, field) in fields {
        let Some((_, value)) = entries.iter().find(|(k, _)| k == name) else {
            if field.required && field.default.is_none() {
                return Err(QuickDbError::validation(path.child(name), "Field required"));
            }
            continue;
        };
        path.push(name);
        let result = validate_value(value, field, path);
        path.pop();
        result?;
    }
    Ok(())
}
