//! Path query functions over JSON text.
//!
//! These parse their input once per call and return string-valued
//! collections, keyed by the path of each resolved node:
//!
//! ```text
//! get_object(json, ["id", "name"])      -> {id: 1, name: Ed}
//! get_object(json, ["$.address.zip"])   -> {address.zip: 98052}
//! get_object(json, ["$..address"])      -> {address: ..., order[0].address: ...}
//! get_object(json, [])                  -> every immediate child of the root
//! ```
//!
//! Missing or empty input yields an empty collection rather than an error,
//! so the functions compose over columns that are often unset.

use indexmap::IndexMap;
use serde_json::Value;
use serde_json_path::JsonPath;

use crate::coerce::token_string;
use crate::error::JsonError;
use crate::path::{anchor_expression, PathSegment, TokenPath};

/// Resolved path to string value; `None` for JSON `null`.
pub type StringMap = IndexMap<String, Option<String>>;

/// Evaluate `paths` against `json` and collect every match.
///
/// With no paths (or only empty ones) the immediate children of the root are
/// returned instead.
///
/// # Example
/// ```
/// use enrich_extract::functions::get_object;
///
/// let json = r#"{"id": 1, "address": {"zip": "98052"}}"#;
/// let map = get_object(Some(json), &["id", "$.address.zip"]).unwrap();
/// assert_eq!(map["id"].as_deref(), Some("1"));
/// assert_eq!(map["address.zip"].as_deref(), Some("98052"));
/// ```
pub fn get_object<S: AsRef<str>>(json: Option<&str>, paths: &[S]) -> Result<StringMap, JsonError> {
    let Some(root) = parse_root(json)? else {
        return Ok(StringMap::new());
    };
    object_from(&root, paths)
}

/// Same as [`get_object`]; kept for callers reading unstructured events.
pub fn get_unstructured_event<S: AsRef<str>>(
    json: Option<&str>,
    paths: &[S],
) -> Result<StringMap, JsonError> {
    get_object(json, paths)
}

/// String values of the root's immediate children, in document order.
pub fn get_array(json: Option<&str>) -> Result<Vec<Option<String>>, JsonError> {
    let Some(root) = parse_root(json)? else {
        return Ok(Vec::new());
    };
    Ok(children(&root)
        .into_iter()
        .map(|(_, node)| token_string(node))
        .collect())
}

/// Each child of the root converted to a map of its own children.
pub fn get_context(json: Option<&str>) -> Result<Vec<StringMap>, JsonError> {
    let Some(root) = parse_root(json)? else {
        return Ok(Vec::new());
    };
    let no_paths: &[&str] = &[];
    children(&root)
        .into_iter()
        .map(|(_, node)| object_from(node, no_paths))
        .collect()
}

fn parse_root(json: Option<&str>) -> Result<Option<Value>, JsonError> {
    match json {
        None | Some("") => Ok(None),
        Some(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(|e| JsonError::parse(&e, text)),
    }
}

fn object_from<S: AsRef<str>>(root: &Value, paths: &[S]) -> Result<StringMap, JsonError> {
    let mut map = StringMap::new();
    let expressions: Vec<&str> = paths
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.trim().is_empty())
        .collect();

    if expressions.is_empty() {
        for (path, node) in children(root) {
            map.insert(path.to_string(), token_string(node));
        }
        return Ok(map);
    }

    for expression in expressions {
        let compiled = compile(expression)?;
        for located in compiled.query_located(root) {
            let path = TokenPath::from_normalized(located.location());
            map.insert(path.to_string(), token_string(located.node()));
        }
    }
    Ok(map)
}

fn compile(expression: &str) -> Result<JsonPath, JsonError> {
    JsonPath::parse(&anchor_expression(expression)).map_err(|e| JsonError::InvalidPath {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Immediate children with their paths; scalars have none.
fn children(root: &Value) -> Vec<(TokenPath<'_>, &Value)> {
    match root {
        Value::Object(object) => object
            .iter()
            .map(|(key, value)| (TokenPath::property(key), value))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let mut path = TokenPath::root();
                path.push(PathSegment::Index(index));
                (path, value)
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_PATHS: &[&str] = &[];

    const WEB_PAGE: &str = r#"{
        "genre": "blog",
        "inLanguage": "en-US",
        "datePublished": "2014-11-06T00:00:00Z",
        "author": "Devesh Shetty",
        "breadcrumb": ["blog", "releases"],
        "keywords": ["snowplow", "javascript", "tracker", "event"]
    }"#;

    fn value<'m>(map: &'m StringMap, key: &str) -> Option<&'m str> {
        map.get(key).and_then(|v| v.as_deref())
    }

    fn assert_web_page(map: &StringMap) {
        assert_eq!(value(map, "genre"), Some("blog"));
        assert_eq!(value(map, "inLanguage"), Some("en-US"));
        assert_eq!(value(map, "datePublished"), Some("2014-11-06T00:00:00Z"));
        assert_eq!(value(map, "author"), Some("Devesh Shetty"));
        assert_eq!(value(map, "breadcrumb"), Some(r#"["blog","releases"]"#));
        assert_eq!(
            value(map, "keywords"),
            Some(r#"["snowplow","javascript","tracker","event"]"#)
        );
    }

    #[test]
    fn test_get_unstructured_event() {
        let json = r#"{
            "targetUrl": "http://www.example.com",
            "elementClasses": ["foreground"],
            "elementId": "exampleLink",
            "boolField": true,
            "intField": 1,
            "floatField": 20.2
        }"#;

        let map = get_unstructured_event(Some(json), NO_PATHS).unwrap();

        assert_eq!(value(&map, "targetUrl"), Some("http://www.example.com"));
        assert_eq!(value(&map, "elementClasses"), Some(r#"["foreground"]"#));
        assert_eq!(value(&map, "elementId"), Some("exampleLink"));
        assert_eq!(value(&map, "boolField"), Some("true"));
        assert_eq!(value(&map, "intField"), Some("1"));
        assert_eq!(value(&map, "floatField"), Some("20.2"));
    }

    #[test]
    fn test_get_object() {
        let map = get_object(Some(WEB_PAGE), NO_PATHS).unwrap();
        assert_eq!(map.len(), 6);
        assert_web_page(&map);
    }

    #[test]
    fn test_get_context() {
        let json = format!("[{}]", WEB_PAGE);
        let contexts = get_context(Some(&json)).unwrap();
        assert_eq!(contexts.len(), 1);
        assert_web_page(&contexts[0]);
    }

    #[test]
    fn test_multiple_context_elements() {
        let json = format!(
            r#"[{}, {{"targetUrl": "http://www.example.com", "elementClasses": ["foreground"], "elementId": "exampleLink"}}]"#,
            WEB_PAGE
        );
        let contexts = get_context(Some(&json)).unwrap();

        assert_eq!(contexts.len(), 2);
        assert_web_page(&contexts[0]);
        assert_eq!(value(&contexts[1], "targetUrl"), Some("http://www.example.com"));
        assert_eq!(value(&contexts[1], "elementClasses"), Some(r#"["foreground"]"#));
        assert_eq!(value(&contexts[1], "elementId"), Some("exampleLink"));
    }

    #[test]
    fn test_get_array() {
        let array = get_array(Some(r#"["hello", "world", "test", "precise"]"#)).unwrap();
        assert_eq!(
            array,
            vec![
                Some("hello".to_string()),
                Some("world".to_string()),
                Some("test".to_string()),
                Some("precise".to_string())
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(get_object(None, NO_PATHS).unwrap().is_empty());
        assert!(get_object(Some(""), &["id"]).unwrap().is_empty());
        assert!(get_array(None).unwrap().is_empty());
        assert!(get_array(Some("")).unwrap().is_empty());
        assert!(get_context(Some("")).unwrap().is_empty());
    }

    #[test]
    fn test_path_expressions() {
        let json = r#"{
            "id": 1,
            "name": "Ed",
            "address": {"zip": "98052"},
            "order": [{"id": 2, "address": "98065"}, {"id": 4, "address": null}]
        }"#;

        let map = get_object(Some(json), &["id", "name"]).unwrap();
        assert_eq!(value(&map, "id"), Some("1"));
        assert_eq!(value(&map, "name"), Some("Ed"));

        let map = get_object(Some(json), &["$.address.zip"]).unwrap();
        assert_eq!(value(&map, "address.zip"), Some("98052"));

        let map = get_object(Some(json), &["$..address"]).unwrap();
        assert_eq!(value(&map, "address"), Some(r#"{"zip":"98052"}"#));
        assert_eq!(value(&map, "order[0].address"), Some("98065"));
        assert_eq!(map.get("order[1].address"), Some(&None));

        let map = get_object(Some(json), &["$.order[?@.id > 2].id"]).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(value(&map, "order[1].id"), Some("4"));
    }

    #[test]
    fn test_array_root_children() {
        let map = get_object(Some(r#"[10, {"a": 1}]"#), NO_PATHS).unwrap();
        assert_eq!(value(&map, "[0]"), Some("10"));
        assert_eq!(value(&map, "[1]"), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_scalar_children_are_empty() {
        let contexts = get_context(Some(r#"[1, null]"#)).unwrap();
        assert_eq!(contexts.len(), 2);
        assert!(contexts.iter().all(|c| c.is_empty()));
        assert!(get_array(Some("42")).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let err = get_object(Some(r#"{"card": "4111"#), NO_PATHS).unwrap_err();
        assert!(matches!(err, JsonError::Parse { length: 15, .. }));
        assert!(!err.to_string().contains("4111"));
    }

    #[test]
    fn test_invalid_path_expression() {
        let err = get_object(Some("{}"), &["$[?"]).unwrap_err();
        assert!(matches!(err, JsonError::InvalidPath { ref expression, .. } if expression == "$[?"));
    }
}
