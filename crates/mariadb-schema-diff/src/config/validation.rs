//! Configuration validation.

use crate::core::identifier::validate_identifier;
use crate::error::{DiffError, Result};

use super::types::{Config, ConnectionConfig};

pub fn validate(config: &Config) -> Result<()> {
    validate_connection("source", &config.source)?;
    validate_connection("dest", &config.dest)?;

    for (label, name) in [
        ("output.migration_file", &config.output.migration_file),
        ("output.rollback_file", &config.output.rollback_file),
        ("output.report_file", &config.output.report_file),
    ] {
        if name.is_empty() {
            return Err(DiffError::Config(format!("{} must not be empty", label)));
        }
    }

    Ok(())
}

fn validate_connection(side: &str, conn: &ConnectionConfig) -> Result<()> {
    if conn.host.is_empty() {
        return Err(DiffError::Config(format!("{}.host must not be empty", side)));
    }
    if conn.port == 0 {
        return Err(DiffError::Config(format!("{}.port must not be 0", side)));
    }
    if conn.user.is_empty() {
        return Err(DiffError::Config(format!("{}.user must not be empty", side)));
    }
    validate_identifier(&conn.schema)
        .map_err(|e| DiffError::Config(format!("{}.schema is invalid: {}", side, e)))?;
    Ok(())
}
