//! Error types for quickdb

use std::fmt;
use thiserror::Error;

/// Result type alias for quickdb operations
pub type Result<T> = std::result::Result<T, QuickDbError>;

/// Unified error type for all quickdb operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuickDbError {
    /// Host value's runtime type disagrees with the declared field type
    #[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Text fails a required lexical pattern (ISO 8601 datetime, UUID)
    #[error("Invalid {expected} format for field '{field}': {value:?}")]
    Format {
        field: String,
        expected: String,
        value: String,
    },

    /// Field has no metadata entry, or its metadata lacks a type descriptor
    #[error("Metadata error for field '{field}': {reason}")]
    Metadata { field: String, reason: String },

    /// Encoded value violates a bound declared in the field metadata
    #[error("Validation error for field '{field}': {message}")]
    Validation { field: String, message: String },

    /// Opaque failure surfaced by the external engine
    #[error("Engine error: {0}")]
    Engine(String),

    /// Model registration rejected by the engine; a startup-order bug
    #[error("Fatal: model '{model}' could not be registered on alias '{alias}': {reason}")]
    FatalRegistration {
        model: String,
        alias: String,
        reason: String,
    },

    /// Database configuration rejected by the engine
    #[error("Fatal: database '{alias}' could not be configured: {reason}")]
    FatalConfiguration { alias: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of [`QuickDbError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TypeMismatch,
    Format,
    Metadata,
    Validation,
    Engine,
    Fatal,
    Serialization,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch => write!(f, "type_mismatch"),
            Self::Format => write!(f, "format_error"),
            Self::Metadata => write!(f, "metadata_error"),
            Self::Validation => write!(f, "validation_error"),
            Self::Engine => write!(f, "engine_error"),
            Self::Fatal => write!(f, "fatal"),
            Self::Serialization => write!(f, "serialization_error"),
            Self::Config => write!(f, "config_error"),
        }
    }
}

impl QuickDbError {
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn format(
        field: impl Into<String>,
        expected: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Format {
            field: field.into(),
            expected: expected.into(),
            value: value.into(),
        }
    }

    pub fn metadata(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Metadata {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Format { .. } => ErrorKind::Format,
            Self::Metadata { .. } => ErrorKind::Metadata,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Engine(_) => ErrorKind::Engine,
            Self::FatalRegistration { .. } | Self::FatalConfiguration { .. } => ErrorKind::Fatal,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns true for configuration-order bugs that should end the process
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }

    /// Returns true for errors raised by the codec before anything reached the engine
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TypeMismatch | ErrorKind::Format | ErrorKind::Metadata
        )
    }
}

impl From<serde_json::Error> for QuickDbError {
    fn from(err: serde_json::Error) -> Self {
        QuickDbError::Serialization(err.to_string())
    }
}
