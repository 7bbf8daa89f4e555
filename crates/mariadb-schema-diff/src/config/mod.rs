//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{DiffError, Result};
use std::path::Path;

impl Config {
    /// Load configuration from a file.
    ///
    /// The format is detected from the file extension: `.json` parses as
    /// JSON, everything else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| DiffError::Config(format!("Failed to parse JSON config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_YAML: &str = r#"
source:
  host: localhost
  port: 3306
  user: root
  password: password
  schema: shop_main

dest:
  host: localhost
  port: 3307
  user: root
  password: password
  schema: shop_replica

output:
  output_dir: ./out
"#;

    const VALID_JSON: &str = r#"{
  "source": {
    "host": "localhost",
    "port": 3306,
    "user": "root",
    "password": "password",
    "schema": "shop_main"
  },
  "dest": {
    "host": "localhost",
    "port": 3307,
    "user": "root",
    "password": "password",
    "schema": "shop_replica"
  }
}"#;

    #[test]
    fn test_from_yaml_valid() {
        let config = Config::from_yaml(VALID_YAML).unwrap();
        assert_eq!(config.source.schema, "shop_main");
        assert_eq!(config.dest.port, 3307);
        assert_eq!(config.output.migration_file, "migration.sql");
    }

    #[test]
    fn test_from_json_valid_with_default_output() {
        let config = Config::from_json(VALID_JSON).unwrap();
        assert_eq!(config.dest.schema, "shop_replica");
        assert_eq!(config.output.rollback_file, "rollback.sql");
    }

    #[test]
    fn test_from_json_invalid_syntax() {
        let result = Config::from_json(r#"{ "source": { broken }"#);
        assert!(matches!(result, Err(DiffError::Config(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let missing_schema = r#"
source:
  host: localhost
  user: root
dest:
  host: localhost
  user: root
  schema: d
"#;
        assert!(Config::from_yaml(missing_schema).is_err());
    }

    #[test]
    fn test_default_port_applied() {
        let yaml = r#"
source:
  host: a
  user: u
  schema: s
dest:
  host: b
  user: u
  schema: d
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.source.port, 3306);
    }

    #[test]
    fn test_load_detects_json_extension() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(VALID_JSON.as_bytes()).unwrap();
        file.flush().unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.source.schema, "shop_main");
    }

    #[test]
    fn test_load_defaults_to_yaml() {
        let mut file = NamedTempFile::with_suffix(".conf").unwrap();
        file.write_all(VALID_YAML.as_bytes()).unwrap();
        file.flush().unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.dest.schema, "shop_replica");
    }
}
