//! Query text validation.
//!
//! The hub's query language is SQL-shaped. The service rejects text without
//! a `SELECT` and a `FROM` clause anyway, so malformed text is caught here
//! before a network round trip is wasted on it.

use crate::error::{Error, Result};

/// Validate SQL-style query text.
///
/// The text must be non-empty and contain both a `SELECT` and a `FROM`
/// clause, matched case-insensitively. Anything stricter (grammar, column
/// names) is the service's call.
pub fn validate_query_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::invalid_argument("query text must not be empty"));
    }

    let lowered = text.to_ascii_lowercase();
    if !lowered.contains("select") || !lowered.contains("from") {
        return Err(Error::invalid_argument(
            "query text must contain SELECT and FROM clauses",
        ));
    }

    Ok(())
}
