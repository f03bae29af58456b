//! Field and model metadata
//!
//! This module defines the schema entries consulted by the encoder and handed to
//! the engine at registration time. The serde representation matches the
//! engine's own model metadata format.

use crate::value::TaggedValue;
use quickdb_common::{QuickDbError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

// ============================================================================
// Field Type
// ============================================================================

/// Declared type of a model field, with its optional bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    String {
        max_length: Option<usize>,
        min_length: Option<usize>,
        regex: Option<String>,
    },
    Integer {
        min_value: Option<i64>,
        max_value: Option<i64>,
    },
    Float {
        min_value: Option<f64>,
        max_value: Option<f64>,
    },
    /// Unbounded text
    Text,
    Boolean,
    DateTime,
    Uuid,
    Json,
    Array {
        item_type: Box<FieldType>,
        max_items: Option<usize>,
        min_items: Option<usize>,
    },
    /// Nested mapping with declared sub-fields
    Object {
        fields: BTreeMap<String, FieldDefinition>,
    },
    /// Foreign key into another collection
    Reference { target_collection: String },
}

impl FieldType {
    /// Unbounded string type
    pub fn string() -> Self {
        Self::String {
            max_length: None,
            min_length: None,
            regex: None,
        }
    }

    /// Unbounded integer type
    pub fn integer() -> Self {
        Self::Integer {
            min_value: None,
            max_value: None,
        }
    }

    /// Unbounded float type
    pub fn float() -> Self {
        Self::Float {
            min_value: None,
            max_value: None,
        }
    }

    /// Array type without item count bounds
    pub fn array(item_type: FieldType) -> Self {
        Self::Array {
            item_type: Box::new(item_type),
            max_items: None,
            min_items: None,
        }
    }

    /// Human-readable type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Float { .. } => "float",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
            Self::Json => "json",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
            Self::Reference { .. } => "reference",
        }
    }
}

// ============================================================================
// Field Definition
// ============================================================================

/// Schema entry describing one field's declared type and constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<TaggedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDefinition {
    /// Create an optional, non-unique field of the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            unique: false,
            indexed: false,
            default: None,
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::string())
    }

    /// String field with length bounds
    pub fn bounded_string(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self::new(FieldType::String {
            max_length,
            min_length,
            regex: None,
        })
    }

    pub fn text() -> Self {
        Self::new(FieldType::Text)
    }

    pub fn integer() -> Self {
        Self::new(FieldType::integer())
    }

    /// Integer field with value bounds
    pub fn bounded_integer(min_value: Option<i64>, max_value: Option<i64>) -> Self {
        Self::new(FieldType::Integer {
            min_value,
            max_value,
        })
    }

    pub fn float() -> Self {
        Self::new(FieldType::float())
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn datetime() -> Self {
        Self::new(FieldType::DateTime)
    }

    pub fn uuid() -> Self {
        Self::new(FieldType::Uuid)
    }

    pub fn json() -> Self {
        Self::new(FieldType::Json)
    }

    pub fn array(item_type: FieldType) -> Self {
        Self::new(FieldType::array(item_type))
    }

    pub fn object(fields: BTreeMap<String, FieldDefinition>) -> Self {
        Self::new(FieldType::Object { fields })
    }

    pub fn reference(target_collection: impl Into<String>) -> Self {
        Self::new(FieldType::Reference {
            target_collection: target_collection.into(),
        })
    }

    /// Set as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set as indexed
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn default_value(mut self, value: TaggedValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Parse externally supplied field metadata
    ///
    /// Metadata without a usable `field_type` descriptor is a `Metadata` error
    /// naming the field.
    pub fn from_json(field_name: &str, raw: &JsonValue) -> Result<Self> {
        let object = raw.as_object().ok_or_else(|| {
            QuickDbError::metadata(field_name, "field metadata must be a JSON object")
        })?;
        match object.get("field_type") {
            None | Some(JsonValue::Null) => {
                return Err(QuickDbError::metadata(field_name, "missing type descriptor"))
            }
            Some(_) => {}
        }
        serde_json::from_value(raw.clone()).map_err(|e| {
            QuickDbError::metadata(field_name, format!("malformed type descriptor: {}", e))
        })
    }
}

// ============================================================================
// Index Definition
// ============================================================================

/// Ordered field list with a uniqueness flag and a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    pub name: String,
}

impl IndexDefinition {
    /// Create an index named `idx_<field1>_<field2>...`
    pub fn new<I, S>(fields: I, unique: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let name = format!("idx_{}", fields.join("_"));
        Self {
            fields,
            unique,
            name,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// ============================================================================
// Model Metadata
// ============================================================================

/// Alias a model targets when it does not name a database
pub const DEFAULT_ALIAS: &str = "default";

/// Named schema for one storage collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub collection_name: String,
    pub database_alias: String,
    pub fields: BTreeMap<String, FieldDefinition>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
    #[serde(default)]
    pub description: String,
}

/// Model metadata as read from a file, before field metadata is checked
#[derive(Deserialize)]
struct RawModelMeta {
    collection_name: String,
    #[serde(default = "default_alias")]
    database_alias: String,
    fields: BTreeMap<String, JsonValue>,
    #[serde(default)]
    indexes: Vec<IndexDefinition>,
    #[serde(default)]
    description: String,
}

fn default_alias() -> String {
    DEFAULT_ALIAS.to_string()
}

impl ModelMeta {
    /// Field metadata by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Check that every index references declared fields
    pub fn validate_indexes(&self) -> Result<()> {
        for index in &self.indexes {
            if index.fields.is_empty() {
                return Err(QuickDbError::metadata(
                    index.name.clone(),
                    "index must reference at least one field",
                ));
            }
            if let Some(missing) = index.fields.iter().find(|f| !self.fields.contains_key(*f)) {
                return Err(QuickDbError::metadata(
                    missing.clone(),
                    format!(
                        "index '{}' references a field not declared on '{}'",
                        index.name, self.collection_name
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Registration payload sent to the engine
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse model metadata from JSON text, checking every field descriptor and index
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawModelMeta = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Parse model metadata from an already decoded JSON value
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let raw: RawModelMeta = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawModelMeta) -> Result<Self> {
        let mut fields = BTreeMap::new();
        for (name, field) in &raw.fields {
            fields.insert(name.clone(), FieldDefinition::from_json(name, field)?);
        }
        let meta = Self {
            collection_name: raw.collection_name,
            database_alias: raw.database_alias,
            fields,
            indexes: raw.indexes,
            description: raw.description,
        };
        meta.validate_indexes()?;
        Ok(meta)
    }
}
