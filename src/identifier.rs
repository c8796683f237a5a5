//! Validation of labels and relationship types
//!
//! Cypher cannot bind labels or relationship types as parameters, so they are
//! written into the statement text. Every such identifier passes through
//! [`validate`] first.

use crate::error::{BridgeError, Result};

/// Longest identifier Neo4j accepts
pub const MAX_IDENTIFIER_LEN: usize = 65534;

/// Check an identifier against `[A-Za-z_][A-Za-z0-9_]*`
pub fn validate<'a>(kind: &str, identifier: &'a str) -> Result<&'a str> {
    let mut chars = identifier.chars();

    let first = chars
        .next()
        .ok_or_else(|| BridgeError::InvalidIdentifier(format!("{} cannot be empty", kind)))?;

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(BridgeError::InvalidIdentifier(format!(
            "{} exceeds {} characters",
            kind, MAX_IDENTIFIER_LEN
        )));
    }

    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(BridgeError::InvalidIdentifier(format!(
            "{} '{}' must start with a letter or underscore",
            kind, identifier
        )));
    }

    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(BridgeError::InvalidIdentifier(format!(
            "{} '{}' contains invalid character '{}'",
            kind, identifier, bad
        )));
    }

    Ok(identifier)
}

/// Validate and backtick-quote an identifier for interpolation
pub fn quoted(kind: &str, identifier: &str) -> Result<String> {
    validate(kind, identifier).map(|id| format!("`{}`", id))
}
