//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database connection (the schema to match).
    pub source: ConnectionConfig,

    /// Destination database connection (the schema to migrate).
    pub dest: ConnectionConfig,

    /// Output file configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Connection parameters for one MariaDB/MySQL schema.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username.
    pub user: String,

    /// Password. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Schema (database) name.
    pub schema: String,
}

// Manual Debug keeps passwords out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Output file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for generated files (default: ./schema_diff_output).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Forward migration file name (default: migration.sql).
    #[serde(default = "default_migration_file")]
    pub migration_file: String,

    /// Rollback file name (default: rollback.sql).
    #[serde(default = "default_rollback_file")]
    pub rollback_file: String,

    /// Comparison report file name (default: comparison_report.txt).
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            migration_file: default_migration_file(),
            rollback_file: default_rollback_file(),
            report_file: default_report_file(),
        }
    }
}

fn default_port() -> u16 {
    3306
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./schema_diff_output")
}

fn default_migration_file() -> String {
    "migration.sql".to_string()
}

fn default_rollback_file() -> String {
    "rollback.sql".to_string()
}

fn default_report_file() -> String {
    "comparison_report.txt".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_not_serialized() {
        let config = ConnectionConfig {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: "secret_password".to_string(),
            schema: "shop".to_string(),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(
            !json.contains("secret_password"),
            "Password was serialized: {}",
            json
        );
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config = ConnectionConfig {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: "secret_password".to_string(),
            schema: "shop".to_string(),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret_password"));
    }

    #[test]
    fn test_output_defaults() {
        let output = OutputConfig::default();
        assert_eq!(output.migration_file, "migration.sql");
        assert_eq!(output.rollback_file, "rollback.sql");
        assert_eq!(output.report_file, "comparison_report.txt");
    }
}
