//! Recursive conversion of JSON trees into [`CoercedValue`] containers.
//!
//! Unlike fixed-field coercion, scalars here are typed by their own JSON
//! token: integers become `Int64`, floats `Double`, ISO timestamps
//! `DateTime`. Nesting is bounded by a configurable depth limit.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::JsonError;
use crate::path::{PathSegment, TokenPath};
use crate::token::{Integer, JsonToken};
use crate::value::CoercedValue;

/// Default nesting limit for normalization.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Normalize any JSON node with the default depth limit.
pub fn normalize(node: &Value) -> Result<CoercedValue, JsonError> {
    normalize_at(node, &TokenPath::root(), DEFAULT_MAX_DEPTH)
}

/// Normalize a node located at `path`, failing once containers nest deeper
/// than `max_depth`.
pub fn normalize_at<'a>(
    node: &'a Value,
    path: &TokenPath<'a>,
    max_depth: usize,
) -> Result<CoercedValue, JsonError> {
    let mut path = path.clone();
    Normalizer { max_depth }.walk(node, &mut path, 0)
}

/// Normalize a JSON object into an insertion-ordered map.
pub fn normalize_object<'a>(
    object: &'a Map<String, Value>,
    path: &TokenPath<'a>,
    max_depth: usize,
) -> Result<IndexMap<String, CoercedValue>, JsonError> {
    let mut path = path.clone();
    Normalizer { max_depth }.walk_object(object, &mut path, 0)
}

struct Normalizer {
    max_depth: usize,
}

impl Normalizer {
    fn walk<'a>(
        &self,
        node: &'a Value,
        path: &mut TokenPath<'a>,
        depth: usize,
    ) -> Result<CoercedValue, JsonError> {
        let value = match JsonToken::classify(node) {
            JsonToken::Object(object) => CoercedValue::Map(self.walk_object(object, path, depth)?),
            JsonToken::Array(items) => CoercedValue::Sequence(self.walk_array(items, path, depth)?),
            JsonToken::Null => CoercedValue::Null,
            JsonToken::Boolean(b) => CoercedValue::Bool(b),
            JsonToken::Integer(Integer::Signed(i)) => CoercedValue::Int64(i),
            JsonToken::Integer(Integer::Unsigned(u)) => CoercedValue::Double(u as f64),
            JsonToken::Float(f) => CoercedValue::Double(f),
            JsonToken::Date(d) => CoercedValue::DateTime(d),
            JsonToken::String(s) => CoercedValue::String(s.to_string()),
        };
        Ok(value)
    }

    fn walk_object<'a>(
        &self,
        object: &'a Map<String, Value>,
        path: &mut TokenPath<'a>,
        depth: usize,
    ) -> Result<IndexMap<String, CoercedValue>, JsonError> {
        self.enter(path, depth)?;
        let mut map = IndexMap::with_capacity(object.len());
        for (key, value) in object {
            path.push(PathSegment::Property(key));
            let normalized = self.walk(value, path, depth + 1)?;
            path.pop();
            map.insert(key.clone(), normalized);
        }
        Ok(map)
    }

    fn walk_array<'a>(
        &self,
        items: &'a [Value],
        path: &mut TokenPath<'a>,
        depth: usize,
    ) -> Result<Vec<CoercedValue>, JsonError> {
        self.enter(path, depth)?;
        let mut sequence = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            path.push(PathSegment::Index(index));
            sequence.push(self.walk(item, path, depth + 1)?);
            path.pop();
        }
        Ok(sequence)
    }

    fn enter(&self, path: &TokenPath<'_>, depth: usize) -> Result<(), JsonError> {
        if depth >= self.max_depth {
            return Err(JsonError::DepthExceeded {
                path: path.to_string(),
                limit: self.max_depth,
            });
        }
        Ok(())
    }
}
