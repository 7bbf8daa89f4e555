//! Identifier validation and backtick quoting.
//!
//! SQL identifiers cannot be passed as parameters in prepared statements,
//! so every identifier interpolated into generated SQL goes through this
//! module: validate first, then quote with backticks, escaping embedded
//! backticks by doubling them.

use crate::error::{DiffError, Result};

/// Maximum identifier length (MySQL/MariaDB limit is 64 characters; some
/// aliases and constraint names go slightly beyond, so stay permissive).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier before it is quoted into generated SQL.
///
/// Rejects empty identifiers, identifiers containing null bytes, and
/// identifiers exceeding the maximum length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DiffError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(DiffError::Config(format!(
            "Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(DiffError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote an identifier using backticks, doubling embedded backticks.
pub fn quote(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Qualify an object name with its schema: `` `schema`.`name` ``.
pub fn qualify(schema: &str, name: &str) -> String {
    format!("{}.{}", quote(schema), quote(name))
}

/// Escape a string literal for interpolation into a SHOW statement.
///
/// SHOW commands cannot be prepared with bind parameters on all server
/// versions, so the schema name is inlined as an escaped literal.
pub fn quote_str(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("my_table").is_ok());
        assert!(validate_identifier("column with spaces").is_ok());
        assert!(validate_identifier("日本語").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        assert!(validate_identifier("table\0name").is_err());
    }

    #[test]
    fn test_validate_identifier_rejects_too_long() {
        let long_name = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_identifier(&long_name).is_err());
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("users"), "`users`");
        assert_eq!(quote("table`name"), "`table``name`");
    }

    #[test]
    fn test_quote_injection_safely_quoted() {
        assert_eq!(
            quote("Robert`); DROP TABLE Students;--"),
            "`Robert``); DROP TABLE Students;--`"
        );
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("shop", "orders"), "`shop`.`orders`");
    }

    #[test]
    fn test_quote_str() {
        assert_eq!(quote_str("shop"), "'shop'");
        assert_eq!(quote_str("o'brien"), "'o''brien'");
        assert_eq!(quote_str("a\\b"), "'a\\\\b'");
    }
}
