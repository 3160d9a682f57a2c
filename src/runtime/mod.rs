//! Runtime for line-by-line event extraction.
//!
//! Holds the extractor state machine, the rows it fills and the YAML
//! configuration that describes the output schema.

pub mod config_loader;
pub mod extractor;
pub mod row;

pub use config_loader::{ConfigError, ExtractorConfig, OnError};
pub use extractor::{EventExtractor, Extraction};
pub use row::{Row, RowError, UpdatableRow};
