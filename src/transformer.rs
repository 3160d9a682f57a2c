//! Event transformers turn one raw input line into canonical event JSON.
//!
//! The extractor only needs the [`EventTransformer`] trait; any closure with
//! the right signature implements it. [`TsvEventTransformer`] is the stock
//! implementation for tab-separated enriched events.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::field_types::{FieldKind, ENRICHED_EVENT_FIELDS, GEO_LOCATION};

/// Converts a raw line into a JSON object string.
///
/// On failure every problem found in the line is returned, not just the
/// first one.
///
/// # Example
///
/// ```rust
/// use enrich_extract::EventTransformer;
///
/// let passthrough = |line: &str| -> Result<String, Vec<String>> { Ok(line.to_string()) };
/// assert_eq!(passthrough.transform("{}").unwrap(), "{}");
/// ```
pub trait EventTransformer {
    fn transform(&self, line: &str) -> Result<String, Vec<String>>;
}

impl<F> EventTransformer for F
where
    F: Fn(&str) -> Result<String, Vec<String>>,
{
    fn transform(&self, line: &str) -> Result<String, Vec<String>> {
        self(line)
    }
}

/// Transformer for tab-separated enriched events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsvEventTransformer;

impl TsvEventTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Build the canonical JSON object for one line.
    pub fn transform_to_value(&self, line: &str) -> Result<Map<String, Value>, Vec<String>> {
        let values: Vec<&str> = line.split('\t').collect();
        if values.len() != ENRICHED_EVENT_FIELDS.len() {
            return Err(vec![format!(
                "Expected {} fields, received {} fields.",
                ENRICHED_EVENT_FIELDS.len(),
                values.len()
            )]);
        }

        let mut event = Map::new();
        let mut errors = Vec::new();
        let mut latitude = None;
        let mut longitude = None;

        for (&(name, kind), &raw) in ENRICHED_EVENT_FIELDS.iter().zip(values.iter()) {
            if raw.is_empty() {
                continue;
            }
            match name {
                "geo_latitude" => latitude = Some(raw),
                "geo_longitude" => longitude = Some(raw),
                _ => {}
            }

            let converted = match name {
                "contexts" | "derived_contexts" => convert_contexts(name, raw, &mut event),
                "unstruct_event" => convert_unstruct(name, raw, &mut event),
                _ => convert_scalar(name, kind, raw).map(|value| {
                    event.insert(name.to_string(), value);
                }),
            };
            if let Err(message) = converted {
                errors.push(message);
            }
        }

        if let (Some(lat), Some(lon)) = (latitude, longitude) {
            event.insert(
                GEO_LOCATION.to_string(),
                Value::String(format!("{},{}", lat, lon)),
            );
        }

        if errors.is_empty() {
            Ok(event)
        } else {
            Err(errors)
        }
    }
}

impl EventTransformer for TsvEventTransformer {
    fn transform(&self, line: &str) -> Result<String, Vec<String>> {
        let event = self.transform_to_value(line)?;
        serde_json::to_string(&event).map_err(|e| vec![e.to_string()])
    }
}

fn convert_scalar(name: &str, kind: FieldKind, raw: &str) -> Result<Value, String> {
    let invalid = || format!("Invalid value for field {} (expected {})", name, kind);
    match kind {
        FieldKind::Int32 => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid()),
        FieldKind::Double => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        FieldKind::Bool => match raw {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        FieldKind::DateTime => convert_timestamp(raw).ok_or_else(invalid),
        FieldKind::String | FieldKind::Sequence | FieldKind::Map => {
            Ok(Value::String(raw.to_string()))
        }
    }
}

fn convert_timestamp(raw: &str) -> Option<Value> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    Some(Value::String(format!("{}Z", raw.replacen(' ', "T", 1))))
}

/// Self-describing JSON: `{"schema": "iglu:...", "data": ...}`.
fn self_describing<'a>(value: &'a Value, field: &str) -> Result<(&'a str, &'a Value), String> {
    let schema = value
        .get("schema")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing schema in field {}", field))?;
    let data = value
        .get("data")
        .ok_or_else(|| format!("Missing data in field {}", field))?;
    Ok((schema, data))
}

fn parse_payload(field: &str, raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| {
        format!(
            "Invalid JSON in field {} at line {}, column {}",
            field,
            e.line(),
            e.column()
        )
    })
}

fn convert_contexts(field: &str, raw: &str, event: &mut Map<String, Value>) -> Result<(), String> {
    let payload = parse_payload(field, raw)?;
    let (_, data) = self_describing(&payload, field)?;
    let contexts = data
        .as_array()
        .ok_or_else(|| format!("Expected an array of contexts in field {}", field))?;

    for context in contexts {
        let (schema, inner) = self_describing(context, field)?;
        let key = column_name("contexts", schema)?;
        match event
            .entry(key)
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(group) => group.push(inner.clone()),
            _ => return Err(format!("Conflicting context column in field {}", field)),
        }
    }
    Ok(())
}

fn convert_unstruct(field: &str, raw: &str, event: &mut Map<String, Value>) -> Result<(), String> {
    let payload = parse_payload(field, raw)?;
    let (_, data) = self_describing(&payload, field)?;
    let (schema, inner) = self_describing(data, field)?;
    event.insert(column_name("unstruct_event", schema)?, inner.clone());
    Ok(())
}

static SCHEMA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^iglu:([a-zA-Z0-9._-]+)/([a-zA-Z0-9_-]+)/[a-zA-Z0-9_-]+/([0-9]+)-[0-9]+-[0-9]+$")
        .expect("schema URI pattern is valid")
});

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^A-Z_])([A-Z])").expect("camel case pattern is valid"));

/// Column name for a schema URI, e.g. `iglu:org.w3/PerformanceTiming/jsonschema/1-0-0`
/// with prefix `contexts` becomes `contexts_org_w3_performance_timing_1`.
pub fn column_name(prefix: &str, schema: &str) -> Result<String, String> {
    let captures = SCHEMA_URI
        .captures(schema)
        .ok_or_else(|| format!("Schema {} does not conform to the Iglu URI format", schema))?;

    let vendor = captures[1].replace(['.', '-'], "_").to_lowercase();
    let name = CAMEL_BOUNDARY
        .replace_all(&captures[2], "${1}_${2}")
        .replace('-', "_")
        .to_lowercase();
    let major = &captures[3];

    Ok(format!("{}_{}_{}_{}", prefix, vendor, name, major))
}
