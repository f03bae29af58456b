//! Engine bridge trait
//!
//! The storage engine is an external collaborator. Every call takes JSON text
//! and returns the JSON text of a [`BridgeResponse`](crate::BridgeResponse)
//! envelope. `Err` is reserved for transport failures (the engine could not be
//! reached or answered garbage); engine-level failures come back as
//! `success: false`.

use crate::config::DatabaseConfig;
use quickdb_common::Result;

/// Entry points of the storage engine
///
/// Calls block until the engine answers.
///
/// # Example
///
/// ```
/// use quickdb::{Bridge, BridgeResponse, DatabaseConfig, MemoryBridge};
///
/// let bridge = MemoryBridge::new();
/// bridge.add_database(&DatabaseConfig::sqlite("default", ":memory:")).unwrap();
///
/// let text = bridge.create("users", r#"{"name": {"String": "alice"}}"#, "default").unwrap();
/// assert!(BridgeResponse::parse(&text).unwrap().success);
/// ```
pub trait Bridge: Send + Sync {
    /// Insert one tagged record (`{field: tagged_value, ...}`)
    fn create(&self, table: &str, data_json: &str, alias: &str) -> Result<String>;

    /// Query with `{conditions?, sort?, limit?, offset?}`
    fn find(&self, table: &str, query_json: &str, alias: &str) -> Result<String>;

    fn find_by_id(&self, table: &str, id: &str, alias: &str) -> Result<String>;

    /// Apply tagged updates to every record matching the conditions
    fn update(&self, table: &str, conditions_json: &str, updates_json: &str, alias: &str)
        -> Result<String>;

    fn delete(&self, table: &str, conditions_json: &str, alias: &str) -> Result<String>;

    fn count(&self, table: &str, conditions_json: &str, alias: &str) -> Result<String>;

    /// Configure a database connection under `config.alias`
    fn add_database(&self, config: &DatabaseConfig) -> Result<String>;

    /// Register serialized model metadata
    fn register_model(&self, model_meta_json: &str) -> Result<String>;

    fn drop_table(&self, table: &str, alias: &str) -> Result<String>;
}
