//! Document loading and traversal
//!
//! A document is flattened into its scalar fragments in document order.
//! Each fragment is addressed by a JSON-pointer style path such as
//! `/items/0/quantity` (`~` and `/` in keys are escaped as `~0` and `~1`).
//! Validators pick fragments with [`Selector`]s, where `*` matches one path
//! segment and `**` matches any number of segments.

use crate::config::FileFormat;
use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A scalar value of a document together with its location
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    segments: Vec<String>,
    path: String,
    text: String,
    parent: Arc<Value>,
}

impl Fragment {
    /// Unescaped path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Escaped path, `/` for a scalar document root
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Text checked by the rules; null is the empty string
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The object or array holding this value, null at the root
    ///
    /// Siblings share one copy of their parent.
    pub fn parent(&self) -> &Arc<Value> {
        &self.parent
    }
}

/// Load a JSON or YAML document
pub fn load_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    match FileFormat::from_path(path) {
        Some(FileFormat::Yaml) => serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        }),
        Some(FileFormat::Json) => serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        }),
        _ => Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON or YAML".to_string(),
        }),
    }
}

/// Flatten a document into its scalar fragments, in document order
pub fn flatten(document: &Value) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut segments = Vec::new();
    collect(document, &Arc::new(Value::Null), &mut segments, &mut fragments);
    fragments
}

fn collect(value: &Value, parent: &Arc<Value>, segments: &mut Vec<String>, out: &mut Vec<Fragment>) {
    match value {
        Value::Object(map) => {
            let shared = Arc::new(value.clone());
            for (key, child) in map {
                segments.push(key.clone());
                collect(child, &shared, segments, out);
                segments.pop();
            }
        }
        Value::Array(items) => {
            let shared = Arc::new(value.clone());
            for (index, child) in items.iter().enumerate() {
                segments.push(index.to_string());
                collect(child, &shared, segments, out);
                segments.pop();
            }
        }
        scalar => out.push(Fragment {
            segments: segments.clone(),
            path: escape_path(segments),
            text: scalar_text(scalar),
            parent: Arc::clone(parent),
        }),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_path(segments: &[String]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments
        .iter()
        .map(|s| format!("/{}", s.replace('~', "~0").replace('/', "~1")))
        .collect()
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SelectorSegment {
    Literal(String),
    Any,
    AnyDepth,
}

/// Pattern over fragment paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    segments: Vec<SelectorSegment>,
}

impl Selector {
    /// Parse a selector such as `/header/customerNumber`, `/items/*/quantity` or `/**/email`
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);

        let mut segments = Vec::new();
        if !body.is_empty() {
            for part in body.split('/') {
                segments.push(match part {
                    "" => {
                        return Err(Error::config(format!(
                            "Invalid selector '{}': empty path segment",
                            source
                        )))
                    }
                    "*" => SelectorSegment::Any,
                    "**" => SelectorSegment::AnyDepth,
                    literal => SelectorSegment::Literal(unescape_segment(literal)),
                });
            }
        }

        Ok(Self {
            source: trimmed.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, fragment: &Fragment) -> bool {
        matches_from(&self.segments, fragment.segments())
    }
}

fn matches_from(pattern: &[SelectorSegment], path: &[String]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((SelectorSegment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| matches_from(rest, &path[skip..]))
        }
        Some((SelectorSegment::Any, rest)) => !path.is_empty() && matches_from(rest, &path[1..]),
        Some((SelectorSegment::Literal(literal), rest)) => {
            path.first() == Some(literal) && matches_from(rest, &path[1..])
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
