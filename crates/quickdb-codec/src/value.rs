//! Tagged value model
//!
//! The engine keeps an enum-like value type internally. Every value that crosses
//! the bridge carries its tag explicitly, at every nesting level:
//!
//! ```text
//! {"String": "alice"}   {"Int": 42}   {"Null": null}
//! {"Array": [{"String": "a"}, {"Int": 1}]}
//! {"Object": {"city": {"String": "Paris"}}}
//! ```

use quickdb_common::{QuickDbError, Result};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt;

/// Tag names understood by the engine, in wire spelling
pub const TAGS: [&str; 9] = [
    "String", "Int", "Float", "Bool", "Null", "DateTime", "Uuid", "Object", "Array",
];

// ============================================================================
// TaggedValue
// ============================================================================

/// A wire value explicitly naming its type alongside its payload
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// ISO 8601 text, kept verbatim
    DateTime(String),
    /// Canonical UUID text, kept verbatim
    Uuid(String),
    /// Ordered field name to value mapping
    Object(Vec<(String, TaggedValue)>),
    Array(Vec<TaggedValue>),
}

impl TaggedValue {
    /// Wire name of the active tag
    pub fn tag(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Bool(_) => "Bool",
            Self::Null => "Null",
            Self::DateTime(_) => "DateTime",
            Self::Uuid(_) => "Uuid",
            Self::Object(_) => "Object",
            Self::Array(_) => "Array",
        }
    }

    /// Check whether `name` is one of the known tags
    pub fn is_tag(name: &str) -> bool {
        TAGS.contains(&name)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text payload of String, DateTime and Uuid values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::DateTime(s) | Self::Uuid(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a field of an Object value
    pub fn get(&self, key: &str) -> Option<&TaggedValue> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Render the tagged JSON form
    pub fn to_json(&self) -> JsonValue {
        let payload = match self {
            Self::String(s) | Self::DateTime(s) | Self::Uuid(s) => JsonValue::String(s.clone()),
            Self::Int(i) => JsonValue::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Null => JsonValue::Null,
            Self::Object(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Array(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        };
        let mut wrapper = Map::with_capacity(1);
        wrapper.insert(self.tag().to_string(), payload);
        JsonValue::Object(wrapper)
    }

    /// Parse the tagged JSON form
    ///
    /// Anything that is not a single-key object with a known tag and a payload of
    /// the matching shape is rejected.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let map = match value {
            JsonValue::Object(map) if map.len() == 1 => map,
            other => {
                return Err(QuickDbError::Serialization(format!(
                    "expected a single-key tagged object, got {}",
                    other
                )))
            }
        };
        let Some((tag, payload)) = map.iter().next() else {
            return Err(QuickDbError::Serialization("empty tagged object".to_string()));
        };

        let mismatch = || {
            QuickDbError::Serialization(format!("invalid payload for tag {}: {}", tag, payload))
        };

        let parsed = match tag.as_str() {
            "String" => Self::String(payload.as_str().ok_or_else(mismatch)?.to_string()),
            "DateTime" => Self::DateTime(payload.as_str().ok_or_else(mismatch)?.to_string()),
            "Uuid" => Self::Uuid(payload.as_str().ok_or_else(mismatch)?.to_string()),
            "Int" => Self::Int(payload.as_i64().ok_or_else(mismatch)?),
            "Float" => Self::Float(payload.as_f64().ok_or_else(mismatch)?),
            "Bool" => Self::Bool(payload.as_bool().ok_or_else(mismatch)?),
            "Null" => Self::Null,
            "Object" => {
                let fields = payload.as_object().ok_or_else(mismatch)?;
                let mut entries = Vec::with_capacity(fields.len());
                for (key, field) in fields {
                    entries.push((key.clone(), Self::from_json(field)?));
                }
                Self::Object(entries)
            }
            "Array" => {
                let items = payload.as_array().ok_or_else(mismatch)?;
                Self::Array(items.iter().map(Self::from_json).collect::<Result<_>>()?)
            }
            unknown => {
                return Err(QuickDbError::Serialization(format!("unknown tag: {}", unknown)))
            }
        };
        Ok(parsed)
    }

    /// Unwrap into the host (untagged) JSON form
    pub fn into_host(self) -> JsonValue {
        match self {
            Self::String(s) | Self::DateTime(s) | Self::Uuid(s) => JsonValue::String(s),
            Self::Int(i) => JsonValue::Number(i.into()),
            Self::Float(f) => Number::from_f64(f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Bool(b) => JsonValue::Bool(b),
            Self::Null => JsonValue::Null,
            Self::Object(entries) => JsonValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_host()))
                    .collect(),
            ),
            Self::Array(items) => {
                JsonValue::Array(items.into_iter().map(Self::into_host).collect())
            }
        }
    }
}

impl fmt::Display for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for TaggedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TaggedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = JsonValue::deserialize(deserializer)?;
        Self::from_json(&raw).map_err(de::Error::custom)
    }
}

macro_rules! impl_from {
    ($source:ty, $variant:ident) => {
        impl From<$source> for TaggedValue {
            fn from(value: $source) -> Self {
                Self::$variant(value.into())
            }
        }
    };
}

impl_from!(&str, String);
impl_from!(String, String);
impl_from!(i32, Int);
impl_from!(i64, Int);
impl_from!(f64, Float);
impl_from!(bool, Bool);

// ============================================================================
// TaggedRecord
// ============================================================================

/// A host record after encoding: field name to tagged value, in input order
///
/// On the wire a record is a plain JSON object whose members are tagged values,
/// not an `Object`-tagged wrapper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedRecord(Vec<(String, TaggedValue)>);

impl TaggedRecord {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: TaggedValue) {
        self.0.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&TaggedValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaggedValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> Vec<(String, TaggedValue)> {
        self.0
    }

    /// Wire form: `{"field": {"Tag": payload}, ...}`
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, TaggedValue)> for TaggedRecord {
    fn from_iter<I: IntoIterator<Item = (String, TaggedValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// Host value helpers
// ============================================================================

/// Human-readable type name of a host value, for error messages
pub fn host_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => "integer",
        JsonValue::Number(_) => "float",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
