//! Output schema declared by the caller and its validation against the
//! enriched-event field contract.
//!
//! A schema is checked once, before any line is read. Every column either
//! names a registry field with the same kind, or follows the dynamic-column
//! convention:
//!
//! - names starting with `contexts` hold a sequence of maps
//! - names starting with `unstruct` hold a single map

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, SchemaMismatch};
use crate::field_types::{self, FieldKind};

/// Prefix of columns holding grouped contexts.
pub const CONTEXTS_PREFIX: &str = "contexts";

/// Prefix of columns holding the unstructured event.
pub const UNSTRUCT_PREFIX: &str = "unstruct";

/// Declared kind of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Bool,
    Int32,
    Double,
    DateTime,
    String,
    Sequence,
    Map,
    SequenceOfMap,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Bool => "Bool",
            ColumnType::Int32 => "Int32",
            ColumnType::Double => "Double",
            ColumnType::DateTime => "DateTime",
            ColumnType::String => "String",
            ColumnType::Sequence => "Sequence",
            ColumnType::Map => "Map",
            ColumnType::SequenceOfMap => "SequenceOfMap",
        };
        f.write_str(name)
    }
}

impl From<FieldKind> for ColumnType {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Bool => ColumnType::Bool,
            FieldKind::Int32 => ColumnType::Int32,
            FieldKind::Double => ColumnType::Double,
            FieldKind::DateTime => ColumnType::DateTime,
            FieldKind::String => ColumnType::String,
            FieldKind::Sequence => ColumnType::Sequence,
            FieldKind::Map => ColumnType::Map,
        }
    }
}

/// A named, typed output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered list of output columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Append a column, builder style.
    ///
    /// # Example
    /// ```
    /// use enrich_extract::{ColumnType, Schema};
    ///
    /// let schema = Schema::default()
    ///     .with_column("app_id", ColumnType::String)
    ///     .with_column("page_urlport", ColumnType::Int32);
    /// assert_eq!(schema.len(), 2);
    /// ```
    pub fn with_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(Column::new(name, column_type));
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

impl FromIterator<Column> for Schema {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Column type a field name must be declared with, or `None` when the name is
/// neither a registry field nor a dynamic column.
pub fn expected_column_type(name: &str) -> Option<ColumnType> {
    if let Some(kind) = field_types::lookup(name) {
        return Some(kind.into());
    }
    if name.starts_with(CONTEXTS_PREFIX) {
        Some(ColumnType::SequenceOfMap)
    } else if name.starts_with(UNSTRUCT_PREFIX) {
        Some(ColumnType::Map)
    } else {
        None
    }
}

/// Check every column of `schema`, reporting all mismatches together.
pub fn validate_schema(schema: &Schema) -> Result<(), ExtractionError> {
    let mut seen = HashSet::with_capacity(schema.len());
    let mut mismatches = Vec::new();

    for column in schema.columns() {
        if !seen.insert(column.name.as_str()) {
            mismatches.push(SchemaMismatch::DuplicateColumn {
                column: column.name.clone(),
            });
            continue;
        }
        match expected_column_type(&column.name) {
            Some(expected) if expected == column.column_type => {}
            Some(expected) => mismatches.push(SchemaMismatch::InvalidColumnType {
                column: column.name.clone(),
                actual: column.column_type,
                expected,
            }),
            None => mismatches.push(SchemaMismatch::InvalidColumnName {
                column: column.name.clone(),
            }),
        }
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(ExtractionError::SchemaMismatch(mismatches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_types() {
        assert_eq!(expected_column_type("app_id"), Some(ColumnType::String));
        assert_eq!(expected_column_type("page_urlport"), Some(ColumnType::Int32));
        assert_eq!(expected_column_type("geo_location"), Some(ColumnType::String));
        assert_eq!(
            expected_column_type("contexts_org_schema_web_page_1"),
            Some(ColumnType::SequenceOfMap)
        );
        assert_eq!(
            expected_column_type("unstruct_event_com_snowplowanalytics_snowplow_link_click_1"),
            Some(ColumnType::Map)
        );
        assert_eq!(expected_column_type("Contexts_upper"), None);
        assert_eq!(expected_column_type("bogus"), None);
    }

    #[test]
    fn test_valid_schema_passes() {
        let schema = Schema::default()
            .with_column("app_id", ColumnType::String)
            .with_column("collector_tstamp", ColumnType::DateTime)
            .with_column("br_features_pdf", ColumnType::Bool)
            .with_column("contexts_org_w3_performance_timing_1", ColumnType::SequenceOfMap)
            .with_column("unstruct_event_com_acme_link_click_1", ColumnType::Map);

        assert!(validate_schema(&schema).is_ok());
    }

    #[test]
    fn test_every_mismatch_reported() {
        let schema = Schema::default()
            .with_column("page_urlport", ColumnType::String)
            .with_column("app_id", ColumnType::String)
            .with_column("bogus", ColumnType::Int32)
            .with_column("contexts_foo_1", ColumnType::Map)
            .with_column("app_id", ColumnType::String);

        let err = validate_schema(&schema).unwrap_err();
        let messages = err.messages();

        assert_eq!(messages.len(), 4);
        assert_eq!(
            messages[0],
            "Invalid columnType String for columnName page_urlport; expected columnType: Int32"
        );
        assert_eq!(messages[1], "Invalid columnName bogus");
        assert_eq!(
            messages[2],
            "Invalid columnType Map for columnName contexts_foo_1; expected columnType: SequenceOfMap"
        );
        assert_eq!(messages[3], "Duplicate columnName app_id");
    }

    #[test]
    fn test_schema_lookup() {
        let schema: Schema = vec![
            Column::new("app_id", ColumnType::String),
            Column::new("user_id", ColumnType::String),
        ]
        .into_iter()
        .collect();

        assert_eq!(schema.position("user_id"), Some(1));
        assert_eq!(schema.column("app_id").map(|c| c.column_type), Some(ColumnType::String));
        assert!(schema.column("missing").is_none());
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["app_id", "user_id"]);
    }

    #[test]
    fn test_column_deserializes_type_key() {
        let column: Column =
            serde_json::from_str(r#"{"name": "contexts_a_b_1", "type": "sequence_of_map"}"#)
                .unwrap();
        assert_eq!(column.column_type, ColumnType::SequenceOfMap);
    }
}
