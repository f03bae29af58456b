//! Format validation for lexically constrained text
//!
//! Pre-compiled patterns for the two text formats the engine types natively:
//! ISO 8601 timestamps and canonical UUIDs.

use once_cell::sync::Lazy;
use regex::Regex;

/// ISO 8601 DateTime: `YYYY-MM-DDTHH:MM:SS[.ffffff][+HH:MM|Z]`
static DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

/// Canonical 8-4-4-4-12 hex UUID, any version
static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

/// Validate ISO 8601 DateTime format
///
/// # Example
/// ```
/// use quickdb_codec::formats::validate_datetime;
///
/// assert!(validate_datetime("2025-10-22T08:30:00.123456+00:00"));
/// assert!(validate_datetime("2025-10-22T08:30:00Z"));
/// assert!(!validate_datetime("22/10/2025"));
/// ```
pub fn validate_datetime(value: &str) -> bool {
    DATETIME_REGEX.is_match(value)
}

/// Validate canonical UUID syntax
///
/// # Example
/// ```
/// use quickdb_codec::formats::validate_uuid;
///
/// assert!(validate_uuid("123e4567-e89b-12d3-a456-426614174000"));
/// assert!(!validate_uuid("not-a-uuid"));
/// ```
pub fn validate_uuid(value: &str) -> bool {
    UUID_REGEX.is_match(value)
}
