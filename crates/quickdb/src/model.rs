//! Model definitions and per-model CRUD handles

use crate::bridge::Bridge;
use crate::condition::{Condition, FindQuery};
use crate::response::BridgeResponse;
use quickdb_codec::{
    encode_record_with_options, validate_field, validate_record, EncodeOptions, FieldDefinition,
    IndexDefinition, ModelMeta, DEFAULT_ALIAS,
};
use quickdb_common::Result;
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// Model Builder
// ============================================================================

/// Collects fields and indexes into [`ModelMeta`]
///
/// # Example
///
/// ```
/// use quickdb::ModelBuilder;
/// use quickdb_codec::{FieldDefinition, IndexDefinition};
///
/// let meta = ModelBuilder::new("User")
///     .field("name", FieldDefinition::string().required())
///     .field("email", FieldDefinition::string().unique())
///     .index(IndexDefinition::new(["email"], true))
///     .build()
///     .unwrap();
///
/// assert_eq!(meta.collection_name, "user");
/// assert_eq!(meta.database_alias, "default");
/// assert_eq!(meta.description, "User model");
/// assert_eq!(meta.indexes[0].name, "idx_email");
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    model_name: String,
    table: Option<String>,
    alias: String,
    description: Option<String>,
    fields: BTreeMap<String, FieldDefinition>,
    indexes: Vec<IndexDefinition>,
}

impl ModelBuilder {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            table: None,
            alias: DEFAULT_ALIAS.to_string(),
            description: None,
            fields: BTreeMap::new(),
            indexes: Vec::new(),
        }
    }

    /// Table or collection name (default: lowercase model name)
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn database_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a field; declaring the same name again replaces it
    pub fn field(mut self, name: impl Into<String>, field: FieldDefinition) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Assemble the metadata, checking that every index names declared fields
    pub fn build(self) -> Result<ModelMeta> {
        let meta = ModelMeta {
            collection_name: self
                .table
                .unwrap_or_else(|| self.model_name.to_lowercase()),
            database_alias: self.alias,
            fields: self.fields,
            indexes: self.indexes,
            description: self
                .description
                .unwrap_or_else(|| format!("{} model", self.model_name)),
        };
        meta.validate_indexes()?;
        Ok(meta)
    }
}

// ============================================================================
// Model Handle
// ============================================================================

/// CRUD operations bound to one model's table and alias
///
/// Inputs are encoded against the model's field metadata before they reach the
/// engine; results come back decoded. Codec failures are returned as `Err`.
/// Engine failures, including an unreachable engine, come back as a response
/// with `success: false`.
pub struct Model<B: Bridge> {
    bridge: Arc<B>,
    meta: ModelMeta,
    options: EncodeOptions,
    validate: bool,
}

impl<B: Bridge> Model<B> {
    pub(crate) fn new(bridge: Arc<B>, meta: ModelMeta, options: EncodeOptions, validate: bool) -> Self {
        Self {
            bridge,
            meta,
            options,
            validate,
        }
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn table(&self) -> &str {
        &self.meta.collection_name
    }

    pub fn alias(&self) -> &str {
        &self.meta.database_alias
    }

    /// Insert one record
    pub fn create(&self, data: &Map<String, JsonValue>) -> Result<BridgeResponse> {
        let record = encode_record_with_options(data, &self.meta, &self.options)?;
        if self.validate {
            validate_record(&record, &self.meta)?;
        }
        let data_json = record.to_json().to_string();
        Ok(self.submit("create", JsonValue::Null, |bridge| {
            bridge.create(self.table(), &data_json, self.alias())
        }))
    }

    pub fn find(&self, query: &FindQuery) -> Result<BridgeResponse> {
        let query_json = serde_json::to_string(query)?;
        Ok(self.submit("find", json!([]), |bridge| {
            bridge.find(self.table(), &query_json, self.alias())
        }))
    }

    pub fn find_by_id(&self, id: &str) -> Result<BridgeResponse> {
        Ok(self.submit("find_by_id", JsonValue::Null, |bridge| {
            bridge.find_by_id(self.table(), id, self.alias())
        }))
    }

    /// Apply `updates` to every matching record; a miss succeeds with 0
    pub fn update(
        &self,
        conditions: &[Condition],
        updates: &Map<String, JsonValue>,
    ) -> Result<BridgeResponse> {
        let record = encode_record_with_options(updates, &self.meta, &self.options)?;
        if self.validate {
            for (name, value) in record.iter() {
                if let Some(field) = self.meta.field(name) {
                    validate_field(value, name, field)?;
                }
            }
        }
        let conditions_json = serde_json::to_string(conditions)?;
        let updates_json = record.to_json().to_string();
        Ok(self.submit("update", json!(0), |bridge| {
            bridge.update(self.table(), &conditions_json, &updates_json, self.alias())
        }))
    }

    /// Delete every matching record; a miss succeeds with 0
    pub fn delete(&self, conditions: &[Condition]) -> Result<BridgeResponse> {
        let conditions_json = serde_json::to_string(conditions)?;
        Ok(self.submit("delete", json!(0), |bridge| {
            bridge.delete(self.table(), &conditions_json, self.alias())
        }))
    }

    pub fn count(&self, conditions: &[Condition]) -> Result<BridgeResponse> {
        let conditions_json = serde_json::to_string(conditions)?;
        Ok(self.submit("count", json!(0), |bridge| {
            bridge.count(self.table(), &conditions_json, self.alias())
        }))
    }

    fn submit<F>(&self, operation: &str, placeholder: JsonValue, call: F) -> BridgeResponse
    where
        F: FnOnce(&B) -> Result<String>,
    {
        debug!(table = %self.table(), alias = %self.alias(), operation, "bridge call");
        match call(self.bridge.as_ref()).and_then(|text| BridgeResponse::parse_decoded(&text)) {
            Ok(response) => response,
            Err(e) => {
                warn!(table = %self.table(), operation, error = %e, "bridge call failed");
                BridgeResponse::failure_with_data(e.to_string(), placeholder)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickdb_common::QuickDbError;

    #[test]
    fn test_builder_defaults() {
        let meta = ModelBuilder::new("BlogPost")
            .field("title", FieldDefinition::string())
            .build()
            .unwrap();
        assert_eq!(meta.collection_name, "blogpost");
        assert_eq!(meta.database_alias, "default");
        assert_eq!(meta.description, "BlogPost model");
        assert!(meta.indexes.is_empty());
    }

    #[test]
    fn test_builder_overrides() {
        let meta = ModelBuilder::new("User")
            .table("accounts")
            .database_alias("main")
            .description("Accounts")
            .field("email", FieldDefinition::string())
            .index(IndexDefinition::new(["email"], true).named("uniq_email"))
            .build()
            .unwrap();
        assert_eq!(meta.collection_name, "accounts");
        assert_eq!(meta.database_alias, "main");
        assert_eq!(meta.description, "Accounts");
        assert_eq!(meta.indexes[0].name, "uniq_email");
        assert!(meta.indexes[0].unique);
    }

    #[test]
    fn test_fields_are_keyed_by_name() {
        let meta = ModelBuilder::new("Event")
            .field("zone", FieldDefinition::string())
            .field("at", FieldDefinition::datetime())
            .field("kind", FieldDefinition::string())
            .build()
            .unwrap();
        let names: Vec<&str> = meta.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["at", "kind", "zone"]);

        let payload: serde_json::Value = serde_json::from_str(&meta.to_json().unwrap()).unwrap();
        let wire: Vec<&str> = payload["fields"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(wire, names);
    }

    #[test]
    fn test_builder_rejects_index_on_undeclared_field() {
        let err = ModelBuilder::new("User")
            .field("name", FieldDefinition::string())
            .index(IndexDefinition::new(["name", "email"], false))
            .build()
            .unwrap_err();
        assert!(matches!(err, QuickDbError::Metadata { ref field, .. } if field == "email"));
    }
}
