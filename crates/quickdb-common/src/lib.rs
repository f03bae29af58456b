//! Common utilities for quickdb
//!
//! This crate provides the error model shared by the codec, the facade and the CLI.

pub mod error;

pub use error::{ErrorKind, QuickDbError, Result};
