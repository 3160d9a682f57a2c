//! Typed values produced by coercion and normalization.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// A value converted into one of the supported target kinds.
///
/// `Int32` only comes out of fixed-field coercion and `Int64` only out of
/// generic normalization; downstream readers rely on the two widths staying
/// apart.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CoercedValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    DateTime(DateTime<Utc>),
    String(String),
    Sequence(Vec<CoercedValue>),
    Map(IndexMap<String, CoercedValue>),
}

impl CoercedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CoercedValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CoercedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            CoercedValue::Int32(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CoercedValue::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CoercedValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            CoercedValue::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CoercedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[CoercedValue]> {
        match self {
            CoercedValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, CoercedValue>> {
        match self {
            CoercedValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&CoercedValue> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl fmt::Display for CoercedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoercedValue::Null => write!(f, "null"),
            CoercedValue::Bool(b) => write!(f, "{}", b),
            CoercedValue::Int32(i) => write!(f, "{}", i),
            CoercedValue::Int64(i) => write!(f, "{}", i),
            CoercedValue::Double(d) => write!(f, "{}", d),
            CoercedValue::DateTime(d) => write!(f, "{}", d.to_rfc3339()),
            CoercedValue::String(s) => write!(f, "{}", s),
            CoercedValue::Sequence(_) | CoercedValue::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

impl From<bool> for CoercedValue {
    fn from(b: bool) -> Self {
        CoercedValue::Bool(b)
    }
}

impl From<i32> for CoercedValue {
    fn from(i: i32) -> Self {
        CoercedValue::Int32(i)
    }
}

impl From<i64> for CoercedValue {
    fn from(i: i64) -> Self {
        CoercedValue::Int64(i)
    }
}

impl From<f64> for CoercedValue {
    fn from(d: f64) -> Self {
        CoercedValue::Double(d)
    }
}

impl From<&str> for CoercedValue {
    fn from(s: &str) -> Self {
        CoercedValue::String(s.to_string())
    }
}

impl From<String> for CoercedValue {
    fn from(s: String) -> Self {
        CoercedValue::String(s)
    }
}

impl From<DateTime<Utc>> for CoercedValue {
    fn from(d: DateTime<Utc>) -> Self {
        CoercedValue::DateTime(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_match_variant() {
        assert_eq!(CoercedValue::Int32(80).as_i32(), Some(80));
        assert_eq!(CoercedValue::Int32(80).as_i64(), None);
        assert_eq!(CoercedValue::Int64(80).as_i64(), Some(80));
        assert_eq!(CoercedValue::from("blog").as_str(), Some("blog"));
        assert!(CoercedValue::Null.is_null());
    }

    #[test]
    fn test_serialize_nested() {
        let mut map = IndexMap::new();
        map.insert("genre".to_string(), CoercedValue::from("blog"));
        map.insert(
            "keywords".to_string(),
            CoercedValue::Sequence(vec!["a".into(), "b".into()]),
        );
        map.insert("missing".to_string(), CoercedValue::Null);

        let json = serde_json::to_string(&CoercedValue::Map(map)).unwrap();
        assert_eq!(json, r#"{"genre":"blog","keywords":["a","b"],"missing":null}"#);
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(CoercedValue::Bool(true).to_string(), "true");
        assert_eq!(CoercedValue::Null.to_string(), "null");
        assert_eq!(
            CoercedValue::Sequence(vec![CoercedValue::Int64(1)]).to_string(),
            "[1]"
        );
    }
}
