//! Schema-validating extractor for enriched events.
//!
//! Lines flow through a small state machine:
//!
//! ```text
//! AwaitingLine -> Transforming -> Populating -> Emitting -> AwaitingLine
//!       |
//!       +--> Exhausted (end of input) / Failed (read error)
//! ```
//!
//! A line that fails to transform or populate yields an `Err` and the
//! iterator moves on to the next line. A read error ends the iteration.

use std::fmt;
use std::io::BufRead;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::coerce::coerce_at;
use crate::error::{ExtractionError, JsonError};
use crate::field_types;
use crate::normalize::{normalize_object, DEFAULT_MAX_DEPTH};
use crate::path::{PathSegment, TokenPath};
use crate::runtime::row::{Row, UpdatableRow};
use crate::schema::{validate_schema, ColumnType, Schema};
use crate::token::JsonToken;
use crate::transformer::EventTransformer;
use crate::value::CoercedValue;

/// Field name reported when the canonical event itself is not an object.
const EVENT_ROOT: &str = "$";

/// Extracts typed rows from enriched event lines.
///
/// The schema is validated once, when the extractor is built; a rejected
/// schema never produces a row.
///
/// # Example
/// ```
/// use enrich_extract::{ColumnType, EventExtractor, Schema};
///
/// let schema = Schema::default().with_column("app_id", ColumnType::String);
/// let passthrough = |line: &str| -> Result<String, Vec<String>> { Ok(line.to_string()) };
/// let extractor = EventExtractor::new(schema, passthrough).unwrap();
///
/// let row = extractor.extract_line(r#"{"app_id": "angry-birds"}"#).unwrap();
/// assert_eq!(row.get_str("app_id"), Some("angry-birds"));
/// ```
pub struct EventExtractor<T> {
    schema: Arc<Schema>,
    transformer: T,
    max_depth: usize,
}

impl<T: EventTransformer> EventExtractor<T> {
    /// Validate `schema` and build an extractor around `transformer`.
    ///
    /// # Errors
    /// `ExtractionError::SchemaMismatch` listing every offending column.
    pub fn new(schema: Schema, transformer: T) -> Result<Self, ExtractionError> {
        validate_schema(&schema)?;
        tracing::debug!("Schema accepted with {} columns", schema.len());
        Ok(Self {
            schema: Arc::new(schema),
            transformer,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Override the nesting limit applied to contexts and unstructured events.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Lazily extract one row per input line.
    pub fn extract<R: BufRead>(&self, reader: R) -> Extraction<'_, T, R> {
        Extraction {
            extractor: self,
            reader,
            state: State::AwaitingLine,
            line_number: 0,
        }
    }

    /// Transform and populate a single line.
    pub fn extract_line(&self, line: &str) -> Result<Row, ExtractionError> {
        let json = self
            .transformer
            .transform(line)
            .map_err(ExtractionError::Transformation)?;
        self.populate(&json)
    }

    /// Populate a row from canonical event JSON.
    ///
    /// Every value is staged first; the row is only written once the whole
    /// event converted cleanly.
    pub fn populate(&self, json: &str) -> Result<Row, ExtractionError> {
        let event: Value = serde_json::from_str(json).map_err(|e| JsonError::parse(&e, json))?;
        let Value::Object(properties) = &event else {
            return Err(ExtractionError::Shape {
                field: EVENT_ROOT.to_string(),
                found: JsonToken::classify(&event).kind(),
            });
        };

        let staged = self.stage(properties)?;

        let mut row = UpdatableRow::new(Arc::clone(&self.schema));
        for (column, value) in staged {
            row.set(column, value)?;
        }
        Ok(row.finalize())
    }

    fn stage<'a>(
        &self,
        properties: &'a Map<String, Value>,
    ) -> Result<Vec<(&'a str, CoercedValue)>, ExtractionError> {
        let mut staged = Vec::with_capacity(self.schema.len());
        for (name, node) in properties {
            let Some(column) = self.schema.column(name) else {
                tracing::trace!("Skipping property '{}' with no declared column", name);
                continue;
            };
            let value = match field_types::lookup(name) {
                Some(kind) => {
                    coerce_at(node, kind.into(), &TokenPath::property(name), self.max_depth)?
                }
                None => self.dynamic_value(name, column.column_type, node)?,
            };
            staged.push((name.as_str(), value));
        }
        Ok(staged)
    }

    /// Contexts arrive as arrays of objects, unstructured events as objects.
    /// The JSON shape must agree with the declared column type.
    fn dynamic_value<'a>(
        &self,
        name: &'a str,
        column_type: ColumnType,
        node: &'a Value,
    ) -> Result<CoercedValue, ExtractionError> {
        let shape_error = |found| ExtractionError::Shape {
            field: name.to_string(),
            found,
        };
        match (column_type, JsonToken::classify(node)) {
            (ColumnType::SequenceOfMap, JsonToken::Array(items)) => {
                let mut maps = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let Value::Object(object) = item else {
                        return Err(shape_error(JsonToken::classify(item).kind()));
                    };
                    let mut path = TokenPath::property(name);
                    path.push(PathSegment::Index(index));
                    maps.push(CoercedValue::Map(normalize_object(
                        object,
                        &path,
                        self.max_depth,
                    )?));
                }
                Ok(CoercedValue::Sequence(maps))
            }
            (ColumnType::Map, JsonToken::Object(object)) => {
                let map = normalize_object(object, &TokenPath::property(name), self.max_depth)?;
                Ok(CoercedValue::Map(map))
            }
            (_, other) => Err(shape_error(other.kind())),
        }
    }
}

impl<T> fmt::Debug for EventExtractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventExtractor")
            .field("schema", &self.schema)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// Position of an [`Extraction`] within its input.
#[derive(Debug)]
enum State {
    AwaitingLine,
    Transforming(String),
    Populating(String),
    Emitting(Row),
    Exhausted,
    Failed,
}

/// Iterator over the rows of one input stream.
///
/// Owns the reader; dropping the iterator releases it.
pub struct Extraction<'e, T, R> {
    extractor: &'e EventExtractor<T>,
    reader: R,
    state: State,
    line_number: usize,
}

impl<T, R> Extraction<'_, T, R> {
    /// Number of lines read so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Exhausted | State::Failed)
    }
}

impl<T: EventTransformer, R: BufRead> Iterator for Extraction<'_, T, R> {
    type Item = Result<Row, ExtractionError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::AwaitingLine) {
                State::AwaitingLine => match read_line(&mut self.reader) {
                    Ok(Some(line)) => {
                        self.line_number += 1;
                        self.state = State::Transforming(line);
                    }
                    Ok(None) => {
                        tracing::debug!("Input exhausted after {} lines", self.line_number);
                        self.state = State::Exhausted;
                        return None;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read line {}: {}", self.line_number + 1, e);
                        self.state = State::Failed;
                        return Some(Err(ExtractionError::Io(e)));
                    }
                },
                State::Transforming(line) => {
                    match self.extractor.transformer.transform(&line) {
                        Ok(json) => self.state = State::Populating(json),
                        Err(messages) => {
                            tracing::debug!(
                                "Line {} failed to transform: {} errors",
                                self.line_number,
                                messages.len()
                            );
                            return Some(Err(ExtractionError::Transformation(messages)));
                        }
                    }
                }
                State::Populating(json) => match self.extractor.populate(&json) {
                    Ok(row) => self.state = State::Emitting(row),
                    Err(e) => {
                        tracing::debug!("Line {} failed to populate: {}", self.line_number, e);
                        return Some(Err(e));
                    }
                },
                State::Emitting(row) => {
                    tracing::trace!("Emitting row for line {}", self.line_number);
                    return Some(Ok(row));
                }
                State::Exhausted => {
                    self.state = State::Exhausted;
                    return None;
                }
                State::Failed => {
                    self.state = State::Failed;
                    return None;
                }
            }
        }
    }
}

/// Read one line, replacing invalid UTF-8 with U+FFFD.
fn read_line<R: BufRead>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
