//! Error types for the schema diff library.

use thiserror::Error;

/// Main error type for schema comparison operations.
#[derive(Error, Debug)]
pub enum DiffError {
    /// Configuration error (invalid YAML, missing fields, bad identifiers).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database driver error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Connection or pool setup error with context.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Object enumeration failed. Fatal: the snapshot cannot be trusted.
    #[error("Failed to enumerate {kind} objects in schema `{schema}`: {message}")]
    Enumeration {
        kind: &'static str,
        schema: String,
        message: String,
    },

    /// A CREATE TABLE statement could not be parsed.
    #[error("Could not parse CREATE TABLE for `{table}`: {message}")]
    Parse { table: String, message: String },

    /// IO error (writing output files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Comparison was cancelled (SIGINT, etc.).
    #[error("Comparison cancelled")]
    Cancelled,
}

impl DiffError {
    /// Create a Connection error with context about where it occurred.
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        DiffError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create an Enumeration error for one object kind.
    pub fn enumeration(
        kind: &'static str,
        schema: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        DiffError::Enumeration {
            kind,
            schema: schema.into(),
            message: message.to_string(),
        }
    }

    /// Create a Parse error for one table.
    pub fn parse(table: impl Into<String>, message: impl Into<String>) -> Self {
        DiffError::Parse {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for the CLI front-end.
    pub fn exit_code(&self) -> u8 {
        match self {
            DiffError::Config(_) | DiffError::Yaml(_) | DiffError::Json(_) => 2,
            DiffError::Database(_) | DiffError::Connection { .. } | DiffError::Enumeration { .. } => 3,
            DiffError::Io(_) => 4,
            DiffError::Cancelled => 130,
            DiffError::Parse { .. } => 1,
        }
    }
}

/// Result type alias for schema diff operations.
pub type Result<T> = std::result::Result<T, DiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_format() {
        let err = DiffError::connection("timed out", "creating source pool");
        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("creating source pool"));
    }

    #[test]
    fn test_enumeration_error_format() {
        let err = DiffError::enumeration("table", "shop", "access denied");
        let msg = err.to_string();
        assert!(msg.contains("table"));
        assert!(msg.contains("`shop`"));
        assert!(msg.contains("access denied"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DiffError::Config("x".into()).exit_code(), 2);
        assert_eq!(DiffError::Cancelled.exit_code(), 130);
        assert_eq!(
            DiffError::parse("t", "unbalanced parentheses").exit_code(),
            1
        );
    }
}
