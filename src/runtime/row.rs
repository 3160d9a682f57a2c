//! Output rows bound to a schema.
//!
//! An [`UpdatableRow`] is filled column by column while a line is processed
//! and then frozen into a read-only [`Row`]. Columns that are never set keep
//! the default value [`CoercedValue::Null`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::schema::Schema;
use crate::value::CoercedValue;

/// Errors raised by the row sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("column '{0}' is not part of the output schema")]
    UnknownColumn(String),
}

/// Mutable row for one input line.
#[derive(Debug, Clone)]
pub struct UpdatableRow {
    schema: Arc<Schema>,
    values: Vec<CoercedValue>,
}

impl UpdatableRow {
    /// Create a row with every column unset.
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = vec![CoercedValue::Null; schema.len()];
        Self { schema, values }
    }

    /// Write a value into the named column.
    ///
    /// # Arguments
    /// * `column` - Column name as declared in the schema
    /// * `value` - Value to store; replaces anything set earlier
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use enrich_extract::{ColumnType, CoercedValue, Schema, UpdatableRow};
    ///
    /// let schema = Arc::new(Schema::default().with_column("app_id", ColumnType::String));
    /// let mut row = UpdatableRow::new(schema);
    /// row.set("app_id", CoercedValue::from("angry-birds")).unwrap();
    /// assert_eq!(row.finalize().get_str("app_id"), Some("angry-birds"));
    /// ```
    pub fn set(&mut self, column: &str, value: CoercedValue) -> Result<(), RowError> {
        let index = self
            .schema
            .position(column)
            .ok_or_else(|| RowError::UnknownColumn(column.to_string()))?;
        self.values[index] = value;
        Ok(())
    }

    pub fn get(&self, column: &str) -> Option<&CoercedValue> {
        self.schema.position(column).map(|i| &self.values[i])
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Freeze the row.
    pub fn finalize(self) -> Row {
        Row {
            schema: self.schema,
            values: self.values,
        }
    }
}

/// Read-only row produced for one input line.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Arc<Schema>,
    values: Vec<CoercedValue>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&CoercedValue> {
        self.schema.position(column).map(|i| &self.values[i])
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(CoercedValue::as_str)
    }

    pub fn get_bool(&self, column: &str) -> Option<bool> {
        self.get(column).and_then(CoercedValue::as_bool)
    }

    pub fn get_i32(&self, column: &str) -> Option<i32> {
        self.get(column).and_then(CoercedValue::as_i32)
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CoercedValue::as_f64)
    }

    pub fn get_date_time(&self, column: &str) -> Option<DateTime<Utc>> {
        self.get(column).and_then(CoercedValue::as_date_time)
    }

    pub fn get_map(&self, column: &str) -> Option<&IndexMap<String, CoercedValue>> {
        self.get(column).and_then(CoercedValue::as_map)
    }

    pub fn get_sequence(&self, column: &str) -> Option<&[CoercedValue]> {
        self.get(column).and_then(CoercedValue::as_sequence)
    }

    /// `true` when the column exists and holds `Null`.
    pub fn is_null(&self, column: &str) -> bool {
        self.get(column).is_some_and(CoercedValue::is_null)
    }

    /// Columns and their values in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CoercedValue)> {
        self.schema.names().zip(self.values.iter())
    }

    pub fn values(&self) -> &[CoercedValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert the row to a JSON object keyed by column name.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
