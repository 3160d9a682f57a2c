//! # enrich-extract: typed rows from enriched analytics events
//!
//! Decodes tab-separated enriched events into rows whose columns are declared
//! by the caller. The declared schema is checked against a fixed field-type
//! contract before any data is read, and the embedded JSON payloads
//! (contexts and the unstructured event) are flattened into one column per
//! schema variant.
//!
//! ## Features
//!
//! - **Field-type registry**: the 131 enriched-event fields and their kinds
//! - **Coercion engine**: JSON to typed values using Json.NET conversion rules
//! - **Normalizer**: nested JSON to ordered maps and sequences, depth-bounded
//! - **Path functions**: JSONPath queries returning string-valued maps
//! - **Extractor**: lazy, line-by-line rows with all-or-nothing population
//!
//! ## Example: configuration
//!
//! ```yaml
//! columns:
//!   - name: app_id
//!     type: string
//!   - name: collector_tstamp
//!     type: date_time
//!   - name: contexts_org_schema_web_page_1
//!     type: sequence_of_map
//!   - name: unstruct_event_com_snowplowanalytics_snowplow_link_click_1
//!     type: map
//! on_error: skip
//! ```
//!
//! ## Example: extraction
//!
//! ```no_run
//! use std::io::BufReader;
//! use enrich_extract::{EventExtractor, ExtractorConfig, TsvEventTransformer};
//!
//! let config = ExtractorConfig::load_from_file("extractor.yaml")?;
//! let extractor = EventExtractor::new(config.schema(), TsvEventTransformer::new())?;
//! let input = BufReader::new(std::fs::File::open("events.tsv")?);
//! for row in extractor.extract(input) {
//!     println!("{}", row?.to_json()?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod coerce;
pub mod error;
pub mod field_types;
pub mod normalize;
pub mod path;
pub mod schema;
pub mod token;
pub mod value;

// Query helpers over JSON text
pub mod functions;

// Line transformation and extraction runtime
pub mod runtime;
pub mod transformer;

pub mod serialization;

// Re-export key types
pub use coerce::{coerce, TargetKind};
pub use error::{ExtractionError, JsonError, SchemaMismatch};
pub use field_types::FieldKind;
pub use normalize::{normalize, DEFAULT_MAX_DEPTH};
pub use schema::{validate_schema, Column, ColumnType, Schema};
pub use token::TokenKind;
pub use value::CoercedValue;

// Re-export runtime types
pub use runtime::{
    ConfigError, EventExtractor, Extraction, ExtractorConfig, OnError, Row, RowError,
    UpdatableRow,
};
pub use transformer::{EventTransformer, TsvEventTransformer};

pub use serialization::{NdjsonWriter, SerializationError};
