//! Type coercion engine.
//!
//! Converts a JSON node into the [`CoercedValue`] required by a target kind.
//! String rendering follows Json.NET's writer so that values look the same
//! whether they were read back from a column or from serialized JSON: floats
//! always keep a fractional part (`1.0`) or an exponent (`1E+20`), and
//! timestamps print as ISO-8601 with a trailing `Z`.

use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JsonError;
use crate::field_types::FieldKind;
use crate::normalize::{normalize_at, normalize_object, DEFAULT_MAX_DEPTH};
use crate::path::TokenPath;
use crate::token::{parse_date_time, Integer, JsonToken};
use crate::value::CoercedValue;

/// Kind requested from the coercion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Bool,
    Int32,
    Double,
    DateTime,
    String,
    Sequence,
    Map,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        FieldKind::from(*self).fmt(f)
    }
}

impl From<FieldKind> for TargetKind {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Bool => TargetKind::Bool,
            FieldKind::Int32 => TargetKind::Int32,
            FieldKind::Double => TargetKind::Double,
            FieldKind::DateTime => TargetKind::DateTime,
            FieldKind::String => TargetKind::String,
            FieldKind::Sequence => TargetKind::Sequence,
            FieldKind::Map => TargetKind::Map,
        }
    }
}

impl From<TargetKind> for FieldKind {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Bool => FieldKind::Bool,
            TargetKind::Int32 => FieldKind::Int32,
            TargetKind::Double => FieldKind::Double,
            TargetKind::DateTime => FieldKind::DateTime,
            TargetKind::String => FieldKind::String,
            TargetKind::Sequence => FieldKind::Sequence,
            TargetKind::Map => FieldKind::Map,
        }
    }
}

/// Coerce a root-level node with the default nesting limit.
pub fn coerce(node: &Value, target: TargetKind) -> Result<CoercedValue, JsonError> {
    coerce_at(node, target, &TokenPath::root(), DEFAULT_MAX_DEPTH)
}

/// Coerce the node found at `path` into `target`.
///
/// JSON `null` becomes [`CoercedValue::Null`] for scalar targets and an empty
/// container for `Sequence` and `Map`. Date-like strings keep their source
/// text when the target is `String`.
pub fn coerce_at<'a>(
    node: &'a Value,
    target: TargetKind,
    path: &TokenPath<'a>,
    max_depth: usize,
) -> Result<CoercedValue, JsonError> {
    let token = JsonToken::classify(node);
    let mismatch = || JsonError::Coercion {
        path: path.to_string(),
        found: token.kind(),
        target,
    };

    let value = match (target, token) {
        (TargetKind::String, JsonToken::Date(_)) => match node {
            Value::String(text) => CoercedValue::String(text.clone()),
            _ => return Err(mismatch()),
        },
        (TargetKind::String, _) => match token_string(node) {
            Some(s) => CoercedValue::String(s),
            None => CoercedValue::Null,
        },

        (TargetKind::Sequence | TargetKind::Map, JsonToken::Null) => empty_container(target),
        (TargetKind::Sequence | TargetKind::Map, JsonToken::String("")) => empty_container(target),
        (TargetKind::Sequence, JsonToken::Array(_)) => normalize_at(node, path, max_depth)?,
        (TargetKind::Map, JsonToken::Object(object)) => {
            CoercedValue::Map(normalize_object(object, path, max_depth)?)
        }
        (TargetKind::Sequence | TargetKind::Map, JsonToken::String(text)) => {
            let embedded: Value = serde_json::from_str(text).map_err(|_| mismatch())?;
            match (target, &embedded) {
                (TargetKind::Sequence, Value::Array(_)) => {
                    normalize_at(&embedded, &TokenPath::root(), max_depth)?
                }
                (TargetKind::Map, Value::Object(object)) => {
                    CoercedValue::Map(normalize_object(object, &TokenPath::root(), max_depth)?)
                }
                _ => return Err(mismatch()),
            }
        }
        (TargetKind::Sequence | TargetKind::Map, _) => return Err(mismatch()),

        (_, JsonToken::Null) => CoercedValue::Null,

        (TargetKind::Bool, JsonToken::Boolean(b)) => CoercedValue::Bool(b),
        (TargetKind::Bool, JsonToken::Integer(i)) => CoercedValue::Bool(i.as_f64() != 0.0),
        (TargetKind::Bool, JsonToken::Float(f)) => CoercedValue::Bool(f != 0.0),
        (TargetKind::Bool, JsonToken::String(s)) => {
            CoercedValue::Bool(parse_bool(s).ok_or_else(mismatch)?)
        }

        (TargetKind::Int32, JsonToken::Integer(i)) => {
            CoercedValue::Int32(integer_to_i32(i).ok_or_else(mismatch)?)
        }
        (TargetKind::Int32, JsonToken::Float(f)) => {
            CoercedValue::Int32(float_to_i32(f).ok_or_else(mismatch)?)
        }
        (TargetKind::Int32, JsonToken::Boolean(b)) => CoercedValue::Int32(i32::from(b)),
        (TargetKind::Int32, JsonToken::String(s)) => {
            CoercedValue::Int32(s.trim().parse().map_err(|_| mismatch())?)
        }

        (TargetKind::Double, JsonToken::Integer(i)) => CoercedValue::Double(i.as_f64()),
        (TargetKind::Double, JsonToken::Float(f)) => CoercedValue::Double(f),
        (TargetKind::Double, JsonToken::Boolean(b)) => {
            CoercedValue::Double(if b { 1.0 } else { 0.0 })
        }
        (TargetKind::Double, JsonToken::String(s)) => {
            CoercedValue::Double(s.trim().parse().map_err(|_| mismatch())?)
        }

        (TargetKind::DateTime, JsonToken::Date(d)) => CoercedValue::DateTime(d),
        (TargetKind::DateTime, JsonToken::String(s)) => {
            CoercedValue::DateTime(parse_date_time(s).ok_or_else(mismatch)?)
        }

        (TargetKind::Bool | TargetKind::Int32 | TargetKind::Double | TargetKind::DateTime, _) => {
            return Err(mismatch())
        }
    };
    Ok(value)
}

fn empty_container(target: TargetKind) -> CoercedValue {
    match target {
        TargetKind::Map => CoercedValue::Map(IndexMap::new()),
        _ => CoercedValue::Sequence(Vec::new()),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn integer_to_i32(i: Integer) -> Option<i32> {
    match i {
        Integer::Signed(i) => i32::try_from(i).ok(),
        Integer::Unsigned(u) => i32::try_from(u).ok(),
    }
}

fn float_to_i32(f: f64) -> Option<i32> {
    let rounded = f.round_ties_even();
    if rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX) {
        Some(rounded as i32)
    } else {
        None
    }
}

/// Render a node as a string the way a JSON writer would print it.
///
/// Returns `None` for JSON `null`. Containers render as compact JSON text.
pub fn token_string(node: &Value) -> Option<String> {
    match JsonToken::classify(node) {
        JsonToken::Null => None,
        JsonToken::String(s) => Some(s.to_string()),
        JsonToken::Integer(i) => Some(i.to_string()),
        JsonToken::Float(f) => Some(format_double(f)),
        JsonToken::Boolean(b) => Some(b.to_string()),
        JsonToken::Date(d) => Some(format_date_time(&d)),
        JsonToken::Array(_) | JsonToken::Object(_) => Some(node.to_string()),
    }
}

/// Shortest round-trip rendering of a double with a guaranteed decimal point
/// or exponent.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..15).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}E{}{:02}", mantissa, sign, exponent.abs());
    }

    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

/// ISO-8601 in UTC with up to seven fractional digits, trailing zeros trimmed.
pub fn format_date_time(value: &DateTime<Utc>) -> String {
    let mut text = value.format("%Y-%m-%dT%H:%M:%S").to_string();
    let ticks = value.nanosecond() % 1_000_000_000 / 100;
    if ticks > 0 {
        let fraction = format!("{:07}", ticks);
        text.push('.');
        text.push_str(fraction.trim_end_matches('0'));
    }
    text.push('Z');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_string_rendering() {
        assert_eq!(token_string(&json!("blog")), Some("blog".to_string()));
        assert_eq!(token_string(&json!(true)), Some("true".to_string()));
        assert_eq!(token_string(&json!(1)), Some("1".to_string()));
        assert_eq!(token_string(&json!(20.2)), Some("20.2".to_string()));
        assert_eq!(token_string(&json!(null)), None);
        assert_eq!(
            token_string(&json!(["blog", "releases"])),
            Some(r#"["blog","releases"]"#.to_string())
        );
        assert_eq!(
            token_string(&json!("2014-11-06T00:00:00Z")),
            Some("2014-11-06T00:00:00Z".to_string())
        );
    }

    #[test]
    fn test_format_double() {
        assert_eq!(format_double(1.0), "1.0");
        assert_eq!(format_double(-122.4124), "-122.4124");
        assert_eq!(format_double(1e20), "1E+20");
        assert_eq!(format_double(1.5e-7), "1.5E-07");
        assert_eq!(format_double(0.0001), "0.0001");
        assert_eq!(format_double(1e-5), "1E-05");
        assert_eq!(format_double(1.234e-5), "1.234E-05");
        assert_eq!(format_double(123456789012345.0), "123456789012345.0");
        assert_eq!(format_double(f64::NAN), "NaN");
    }

    #[test]
    fn test_format_date_time() {
        let whole = Utc.with_ymd_and_hms(2013, 11, 26, 0, 2, 5).unwrap();
        assert_eq!(format_date_time(&whole), "2013-11-26T00:02:05Z");

        let millis = whole + chrono::Duration::milliseconds(290);
        assert_eq!(format_date_time(&millis), "2013-11-26T00:02:05.29Z");
    }

    #[test]
    fn test_coerce_bool() {
        assert_eq!(coerce(&json!(true), TargetKind::Bool).unwrap(), CoercedValue::Bool(true));
        assert_eq!(coerce(&json!("true"), TargetKind::Bool).unwrap(), CoercedValue::Bool(true));
        assert_eq!(coerce(&json!(" False "), TargetKind::Bool).unwrap(), CoercedValue::Bool(false));
        assert_eq!(coerce(&json!(0), TargetKind::Bool).unwrap(), CoercedValue::Bool(false));
        assert!(coerce(&json!("yes"), TargetKind::Bool).is_err());
    }

    #[test]
    fn test_coerce_int32() {
        assert_eq!(coerce(&json!(80), TargetKind::Int32).unwrap(), CoercedValue::Int32(80));
        assert_eq!(coerce(&json!("443"), TargetKind::Int32).unwrap(), CoercedValue::Int32(443));
        assert_eq!(coerce(&json!(2.5), TargetKind::Int32).unwrap(), CoercedValue::Int32(2));
        assert_eq!(coerce(&json!(3.5), TargetKind::Int32).unwrap(), CoercedValue::Int32(4));
        assert_eq!(coerce(&json!(null), TargetKind::Int32).unwrap(), CoercedValue::Null);
    }

    #[test]
    fn test_int32_overflow_fails() {
        let err = coerce(&json!(1415358089861_i64), TargetKind::Int32).unwrap_err();
        assert!(matches!(
            err,
            JsonError::Coercion { found: TokenKind::Integer, target: TargetKind::Int32, .. }
        ));
    }

    #[test]
    fn test_non_numeric_text_fails_without_leaking_value() {
        let node = json!({"page_urlport": "secret-port"});
        let err = coerce_at(
            &node["page_urlport"],
            TargetKind::Int32,
            &TokenPath::property("page_urlport"),
            DEFAULT_MAX_DEPTH,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("page_urlport"));
        assert!(message.contains("String"));
        assert!(message.contains("Int32"));
        assert!(!message.contains("secret-port"));
    }

    #[test]
    fn test_coerce_double_and_date() {
        assert_eq!(coerce(&json!(37), TargetKind::Double).unwrap(), CoercedValue::Double(37.0));
        assert_eq!(
            coerce(&json!("-122.4124"), TargetKind::Double).unwrap(),
            CoercedValue::Double(-122.4124)
        );
        assert_eq!(
            coerce(&json!("2013-11-26T00:02:05Z"), TargetKind::DateTime).unwrap(),
            CoercedValue::DateTime(Utc.with_ymd_and_hms(2013, 11, 26, 0, 2, 5).unwrap())
        );
        assert!(coerce(&json!(1385424125), TargetKind::DateTime).is_err());
        assert!(coerce(&json!([1]), TargetKind::Double).is_err());
    }

    #[test]
    fn test_coerce_string_from_scalars() {
        assert_eq!(coerce(&json!(80), TargetKind::String).unwrap(), CoercedValue::from("80"));
        assert_eq!(coerce(&json!(""), TargetKind::String).unwrap(), CoercedValue::from(""));
        assert_eq!(coerce(&json!(null), TargetKind::String).unwrap(), CoercedValue::Null);
        assert_eq!(
            coerce(&json!({"a": 1}), TargetKind::String).unwrap(),
            CoercedValue::from(r#"{"a":1}"#)
        );
    }

    #[test]
    fn test_date_like_text_kept_for_string_target() {
        assert_eq!(
            coerce(&json!("2013-11-26T00:03:57.885"), TargetKind::String).unwrap(),
            CoercedValue::from("2013-11-26T00:03:57.885")
        );
        assert_eq!(
            coerce(&json!("2013-11-26T02:03:57+02:00"), TargetKind::String).unwrap(),
            CoercedValue::from("2013-11-26T02:03:57+02:00")
        );
    }

    #[test]
    fn test_coerce_containers() {
        assert_eq!(
            coerce(&json!(null), TargetKind::Map).unwrap(),
            CoercedValue::Map(IndexMap::new())
        );
        assert_eq!(
            coerce(&json!(""), TargetKind::Sequence).unwrap(),
            CoercedValue::Sequence(Vec::new())
        );

        let map = coerce(&json!({"genre": "blog"}), TargetKind::Map).unwrap();
        assert_eq!(map.get("genre"), Some(&CoercedValue::from("blog")));

        let seq = coerce(&json!([1, "a"]), TargetKind::Sequence).unwrap();
        assert_eq!(
            seq,
            CoercedValue::Sequence(vec![CoercedValue::Int64(1), CoercedValue::from("a")])
        );

        let embedded = coerce(&json!(r#"{"id": 7}"#), TargetKind::Map).unwrap();
        assert_eq!(embedded.get("id"), Some(&CoercedValue::Int64(7)));
    }

    #[test]
    fn test_container_mismatch_fails() {
        assert!(matches!(
            coerce(&json!("blog"), TargetKind::Map),
            Err(JsonError::Coercion { found: TokenKind::String, target: TargetKind::Map, .. })
        ));
        assert!(coerce(&json!({"a": 1}), TargetKind::Sequence).is_err());
        assert!(coerce(&json!("[1]"), TargetKind::Map).is_err());
        assert!(coerce(&json!(5), TargetKind::Sequence).is_err());
    }
}
