//! Validation of names that become path segments on disk.
//!
//! Type names and record identifiers are embedded verbatim in the store
//! layout (`<base>/<type>/<shard>/<id>.json`). Each must therefore be a single
//! non-traversing path segment:
//! - Must be non-blank
//! - Must not contain `/`, `\` or control characters (including NUL)
//! - Must not start with `.` (covers `.`, `..` and hidden temp files)
//!
//! Type names additionally must not have surrounding whitespace.

use crate::error::{TypeError, TypeResult};

/// Characters that are forbidden anywhere in a segment.
const FORBIDDEN_CHARS: &[char] = &['/', '\\'];

fn invalid(kind: &'static str, name: &str, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidName {
        kind,
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn validate_segment(kind: &'static str, name: &str) -> TypeResult<()> {
    if name.trim().is_empty() {
        return Err(invalid(kind, name, "must not be blank"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(
                kind,
                name,
                format!("contains forbidden character: {ch:?}"),
            ));
        }
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(invalid(
            kind,
            name,
            format!("contains control character: {ch:?}"),
        ));
    }

    if name.starts_with('.') {
        return Err(invalid(kind, name, "must not start with '.'"));
    }

    Ok(())
}

/// Validate an entity type name, returning `Ok(())` if it can name a
/// directory directly under the store's base directory.
///
/// ```
/// use shelf_types::validate_type_name;
///
/// assert!(validate_type_name("Widget").is_ok());
/// assert!(validate_type_name("com.example.Widget").is_ok());
/// assert!(validate_type_name("").is_err());
/// assert!(validate_type_name("../etc").is_err());
/// ```
pub fn validate_type_name(name: &str) -> TypeResult<()> {
    validate_segment("type name", name)?;
    if name.trim() != name {
        return Err(invalid(
            "type name",
            name,
            "must not have leading or trailing whitespace",
        ));
    }
    Ok(())
}

/// Validate a record identifier, returning `Ok(())` if `<id>.json` is a safe
/// file name inside a shard directory.
pub fn validate_identifier(id: &str) -> TypeResult<()> {
    validate_segment("identifier", id)
}
