//! Extractor configuration loader.
//!
//! Loads the output schema and extraction options from YAML:
//!
//! ```yaml
//! columns:
//!   - name: app_id
//!     type: string
//!   - name: contexts_org_schema_web_page_1
//!     type: sequence_of_map
//! max_depth: 64
//! on_error: skip
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::normalize::DEFAULT_MAX_DEPTH;
use crate::schema::{Column, Schema};

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config declares no columns")]
    NoColumns,

    #[error("max_depth must be at least 1")]
    InvalidMaxDepth,
}

/// What to do with a line that fails to extract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    /// Stop at the first failing line.
    #[default]
    Fail,
    /// Log the failure and continue with the next line.
    Skip,
}

/// Extraction settings: output columns plus options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub columns: Vec<Column>,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default)]
    pub on_error: OnError,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl ExtractorConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns error if the file can't be read or has an invalid format
    ///
    /// # Example
    /// ```ignore
    /// use enrich_extract::ExtractorConfig;
    ///
    /// let config = ExtractorConfig::load_from_file("config/extractor.yaml")?;
    /// println!("{} columns", config.columns.len());
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ExtractorConfig = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::NoColumns);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth);
        }
        Ok(())
    }

    /// Output schema in declaration order.
    ///
    /// Column names and types are not checked here; the extractor validates
    /// them against the field contract.
    pub fn schema(&self) -> Schema {
        self.columns.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
columns:
  - name: app_id
    type: string
  - name: page_urlport
    type: int32
  - name: contexts_org_schema_web_page_1
    type: sequence_of_map
max_depth: 16
on_error: skip
"#;
        let config = ExtractorConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.max_depth, 16);
        assert_eq!(config.on_error, OnError::Skip);
        let schema = config.schema();
        assert_eq!(schema.len(), 3);
        assert_eq!(
            schema.column("contexts_org_schema_web_page_1").map(|c| c.column_type),
            Some(ColumnType::SequenceOfMap)
        );
    }

    #[test]
    fn test_defaults() {
        let config = ExtractorConfig::from_yaml_str("columns:\n  - {name: app_id, type: string}\n")
            .unwrap();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.on_error, OnError::Fail);
    }

    #[test]
    fn test_rejects_empty_or_invalid() {
        assert!(matches!(
            ExtractorConfig::from_yaml_str("columns: []"),
            Err(ConfigError::NoColumns)
        ));
        assert!(matches!(
            ExtractorConfig::from_yaml_str("columns:\n  - {name: a, type: string}\nmax_depth: 0\n"),
            Err(ConfigError::InvalidMaxDepth)
        ));
        assert!(matches!(
            ExtractorConfig::from_yaml_str("columns:\n  - {name: a, type: varchar}\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "columns:\n  - name: user_id\n    type: string").unwrap();

        let config = ExtractorConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.columns[0].name, "user_id");
    }

    #[test]
    fn test_missing_file() {
        let err = ExtractorConfig::load_from_file("/nonexistent/extractor.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/extractor.yaml"));
    }
}
