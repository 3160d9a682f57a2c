//! Token paths within a JSON document.
//!
//! Paths are rendered the way Json.NET prints `JToken.Path`: dotted property
//! names, bracketed indexes and quoted brackets for names that would not
//! survive a dotted form, e.g. `order[0].address` or `['odd key'].zip`.

use std::borrow::Cow;
use std::fmt;

use serde_json_path::{NormalizedPath, PathElement};

/// A segment in a token path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    /// An object property
    Property(&'a str),
    /// An array index
    Index(usize),
}

/// Location of a node relative to the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPath<'a> {
    segments: Vec<PathSegment<'a>>,
}

impl<'a> TokenPath<'a> {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn property(name: &'a str) -> Self {
        Self {
            segments: vec![PathSegment::Property(name)],
        }
    }

    pub fn index(index: usize) -> Self {
        Self {
            segments: vec![PathSegment::Index(index)],
        }
    }

    /// Convert a location reported by the JSONPath evaluator.
    pub fn from_normalized(path: &NormalizedPath<'a>) -> Self {
        let segments = path
            .iter()
            .map(|element| match element {
                PathElement::Name(name) => PathSegment::Property(*name),
                PathElement::Index(index) => PathSegment::Index(*index),
            })
            .collect();
        Self { segments }
    }

    pub fn push(&mut self, segment: PathSegment<'a>) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment<'a>> {
        self.segments.pop()
    }

    pub fn segments(&self) -> &[PathSegment<'a>] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for TokenPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Property(name) if needs_brackets(name) => {
                    write!(f, "['{}']", escape_quoted(name))?
                }
                PathSegment::Property(name) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
            }
        }
        Ok(())
    }
}

fn needs_brackets(name: &str) -> bool {
    name.is_empty()
        || name.chars().any(|c| {
            matches!(
                c,
                '.' | ' '
                    | '\''
                    | '/'
                    | '"'
                    | '['
                    | ']'
                    | '('
                    | ')'
                    | '\t'
                    | '\n'
                    | '\r'
                    | '\u{000C}'
                    | '\u{0008}'
                    | '\\'
                    | '\u{0085}'
                    | '\u{2028}'
                    | '\u{2029}'
            )
        })
}

fn escape_quoted(name: &str) -> Cow<'_, str> {
    if name.contains(['\'', '\\']) {
        Cow::Owned(name.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Anchor a path expression at the document root.
///
/// Expressions may be written relative to the root (`id`, `address.zip`,
/// `[0].name`); the evaluator only accepts absolute ones.
pub fn anchor_expression(expression: &str) -> Cow<'_, str> {
    let trimmed = expression.trim();
    if trimmed.starts_with('$') {
        Cow::Borrowed(trimmed)
    } else if trimmed.starts_with('[') {
        Cow::Owned(format!("${}", trimmed))
    } else {
        Cow::Owned(format!("$.{}", trimmed))
    }
}
