//! QuickDB Codec
//!
//! Typed value codec for the quickdb engine bridge.
//!
//! The engine keeps a strongly typed value enum internally, while application
//! data arrives as plain JSON. This crate carries the type information across
//! that boundary:
//!
//! - [`value`]: the tagged wire representation (`{"String": ..}`, `{"Int": ..}`, ...)
//! - [`schema`]: field and model metadata that drive encoding
//! - [`encoder`]: host JSON to tagged values, enforcing declared field types
//! - [`decoder`]: tagged values back to host JSON, total over any input
//! - [`constraints`]: bounds declared in metadata (length, range, item counts)
//!
//! # Example
//!
//! ```rust
//! use quickdb_codec::{decode, encode, FieldDefinition, FieldType};
//! use serde_json::json;
//!
//! let tags = FieldDefinition::array(FieldType::string());
//! let tagged = encode(&json!(["a", "b"]), "tags", &tags).unwrap();
//! assert_eq!(
//!     tagged.to_json(),
//!     json!({"Array": [{"String": "a"}, {"String": "b"}]})
//! );
//!
//! assert_eq!(decode(&tagged.to_json()), json!(["a", "b"]));
//! ```

pub mod config;
pub mod constraints;
pub mod context;
pub mod decoder;
pub mod encoder;
pub mod formats;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use config::{ArrayItemMode, EncodeOptions};
pub use constraints::{validate_field, validate_record};
pub use context::FieldPath;
pub use decoder::decode;
pub use encoder::{encode, encode_record, encode_record_with_options, encode_with_options};
pub use schema::{FieldDefinition, FieldType, IndexDefinition, ModelMeta, DEFAULT_ALIAS};
pub use value::{TaggedRecord, TaggedValue, TAGS};

pub use quickdb_common::{QuickDbError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
