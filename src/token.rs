//! Typed view over JSON nodes.
//!
//! `serde_json::Value` knows numbers and strings but not the finer token
//! kinds the coercion rules are written against: integer versus float, and
//! strings that are really ISO-8601 timestamps. [`JsonToken`] classifies a
//! node once so every consumer matches exhaustively on the same closed set.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{Map, Number, Value};

/// Kind of a JSON token, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Date,
    Array,
    Object,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Null => "Null",
            TokenKind::Boolean => "Boolean",
            TokenKind::Integer => "Integer",
            TokenKind::Float => "Float",
            TokenKind::String => "String",
            TokenKind::Date => "Date",
            TokenKind::Array => "Array",
            TokenKind::Object => "Object",
        };
        f.write_str(name)
    }
}

/// Integer token payload; JSON integers above `i64::MAX` still fit in `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integer {
    Signed(i64),
    Unsigned(u64),
}

impl Integer {
    pub fn as_f64(self) -> f64 {
        match self {
            Integer::Signed(i) => i as f64,
            Integer::Unsigned(u) => u as f64,
        }
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integer::Signed(i) => write!(f, "{}", i),
            Integer::Unsigned(u) => write!(f, "{}", u),
        }
    }
}

/// A classified JSON node borrowing from the parsed document.
#[derive(Debug, Clone, Copy)]
pub enum JsonToken<'a> {
    Null,
    Boolean(bool),
    Integer(Integer),
    Float(f64),
    String(&'a str),
    Date(DateTime<Utc>),
    Array(&'a [Value]),
    Object(&'a Map<String, Value>),
}

impl<'a> JsonToken<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Null => JsonToken::Null,
            Value::Bool(b) => JsonToken::Boolean(*b),
            Value::Number(n) => classify_number(n),
            Value::String(s) => match parse_iso_date(s) {
                Some(date) => JsonToken::Date(date),
                None => JsonToken::String(s),
            },
            Value::Array(items) => JsonToken::Array(items),
            Value::Object(map) => JsonToken::Object(map),
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            JsonToken::Null => TokenKind::Null,
            JsonToken::Boolean(_) => TokenKind::Boolean,
            JsonToken::Integer(_) => TokenKind::Integer,
            JsonToken::Float(_) => TokenKind::Float,
            JsonToken::String(_) => TokenKind::String,
            JsonToken::Date(_) => TokenKind::Date,
            JsonToken::Array(_) => TokenKind::Array,
            JsonToken::Object(_) => TokenKind::Object,
        }
    }
}

fn classify_number(n: &Number) -> JsonToken<'static> {
    if let Some(i) = n.as_i64() {
        JsonToken::Integer(Integer::Signed(i))
    } else if let Some(u) = n.as_u64() {
        JsonToken::Integer(Integer::Unsigned(u))
    } else {
        JsonToken::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,7})?(Z|[+-]\d{2}:\d{2})?$")
        .expect("ISO date pattern is valid")
});

/// Recognise the timestamp shapes a JSON reader treats as date tokens.
///
/// Offsets are converted to UTC; a timestamp without an offset is taken to be
/// UTC already.
pub fn parse_iso_date(text: &str) -> Option<DateTime<Utc>> {
    if !ISO_DATE.is_match(text) {
        return None;
    }
    if text.ends_with('Z') || text[19..].contains(['+', '-']) {
        return DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse the looser timestamp forms accepted for `DateTime` columns.
pub fn parse_date_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Some(date) = parse_iso_date(text) {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}
