//! QuickDB model registration and engine bridge
//!
//! This crate sits between application code and a storage engine reached
//! through the [`Bridge`] trait. It provides:
//!
//! - [`ModelBuilder`]: explicit field and index declaration
//! - [`QuickDb`]: database configuration and (deferred) model registration
//! - [`Model`]: per-model CRUD with metadata-driven encoding of inputs
//! - [`MemoryBridge`]: an in-process engine implementing the bridge contract
//!
//! # Example
//!
//! ```
//! use quickdb::{DatabaseConfig, MemoryBridge, ModelBuilder, QuickDb};
//! use quickdb_codec::FieldDefinition;
//! use serde_json::json;
//!
//! let mut db = QuickDb::new(MemoryBridge::new());
//!
//! // Queued: no database is configured yet
//! db.model(
//!     ModelBuilder::new("User")
//!         .field("name", FieldDefinition::string().required())
//!         .field("age", FieldDefinition::integer())
//!         .build()
//!         .unwrap(),
//! );
//! db.add_database(DatabaseConfig::sqlite("default", ":memory:")).unwrap();
//!
//! let users = db.handle("user").unwrap();
//! let data = json!({"name": "alice", "age": 30});
//! let created = users.create(data.as_object().unwrap()).unwrap();
//! assert!(created.success);
//! ```

pub mod app;
pub mod bridge;
pub mod condition;
pub mod config;
pub mod logging;
pub mod memory;
pub mod model;
pub mod registry;
pub mod response;

pub use app::QuickDb;
pub use bridge::Bridge;
pub use condition::{Condition, FindQuery, LogicalOperator, QueryOperator, SortConfig, SortDirection};
pub use config::{AppConfig, DatabaseBackend, DatabaseConfig, IdStrategy, PoolConfig};
pub use logging::{init_logging, is_logging_initialized};
pub use memory::MemoryBridge;
pub use model::{Model, ModelBuilder};
pub use registry::RegistrationQueue;
pub use response::BridgeResponse;

pub use quickdb_common::{ErrorKind, QuickDbError, Result};
