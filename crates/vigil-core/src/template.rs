//! Message templates
//!
//! Bundle messages prefixed with `ftl:` are templates. Text is copied as-is
//! and `${...}` interpolations are replaced with values from a variable scope:
//!
//! - `${path}` looks up a top-level variable
//! - `${order.header.id}` walks into nested objects
//! - `${items[0].sku}` and `${row["order-id"]}` index arrays and quoted keys
//! - `${name!"n/a"}` supplies a default when the value is missing or null;
//!   a bare `!` defaults to the empty string
//!
//! Missing values without a default and non-scalar values are errors.
//!
//! Copyright (c) 2025 Vigil Team
//! Licensed under the Apache-2.0 license

use crate::context::Variables;
use serde_json::Value;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Errors raised while parsing or rendering a template
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Template syntax error at offset {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("The expression '{expression}' is undefined or null")]
    Undefined { expression: String },

    #[error("The expression '{expression}' evaluated to {kind}, which cannot be rendered as text")]
    NotScalar {
        expression: String,
        kind: &'static str,
    },
}

/// One step of a variable path
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A parsed `${...}` interpolation
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    source: String,
    path: Vec<PathSegment>,
    default: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Interpolation(Interpolation),
}

/// A parsed template, ready to render any number of times
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let segments = Parser::new(source).parse()?;
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The interpolations in template order
    pub fn interpolations(&self) -> impl Iterator<Item = &Interpolation> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Interpolation(interpolation) => Some(interpolation),
            Segment::Text(_) => None,
        })
    }

    pub fn render(&self, scope: &Variables) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Interpolation(interpolation) => {
                    out.push_str(&interpolation.evaluate(scope)?);
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Interpolation {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    fn lookup<'v>(&self, scope: &'v Variables) -> Option<&'v Value> {
        let mut segments = self.path.iter();
        let mut current = match segments.next()? {
            PathSegment::Key(key) => scope.get(key)?.as_ref(),
            PathSegment::Index(_) => return None,
        };
        for segment in segments {
            current = match segment {
                PathSegment::Key(key) => current.as_object()?.get(key)?,
                PathSegment::Index(idx) => current.as_array()?.get(*idx)?,
            };
        }
        Some(current)
    }

    fn evaluate(&self, scope: &Variables) -> Result<String, TemplateError> {
        match (self.lookup(scope), &self.default) {
            (None | Some(Value::Null), Some(default)) => Ok(default.clone()),
            (None | Some(Value::Null), None) => Err(TemplateError::Undefined {
                expression: self.source.clone(),
            }),
            (Some(Value::String(s)), _) => Ok(s.clone()),
            (Some(Value::Number(n)), _) => Ok(n.to_string()),
            (Some(Value::Bool(b)), _) => Ok(b.to_string()),
            (Some(Value::Array(_)), _) => Err(TemplateError::NotScalar {
                expression: self.source.clone(),
                kind: "a sequence",
            }),
            (Some(Value::Object(_)), _) => Err(TemplateError::NotScalar {
                expression: self.source.clone(),
                kind: "a hash",
            }),
        }
    }
}

/// Recursive descent parser over the template text
struct Parser<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    fn parse(mut self) -> Result<Vec<Segment>, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();

        while let Some(ch) = self.advance() {
            if ch == '$' && self.current_char() == Some('{') {
                self.advance();
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Interpolation(self.parse_interpolation()?));
            } else {
                text.push(ch);
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok(segments)
    }

    /// Parse the body of `${...}`; the opening `${` is already consumed
    fn parse_interpolation(&mut self) -> Result<Interpolation, TemplateError> {
        let start = self.position;
        self.skip_whitespace();

        let path = self.parse_path()?;
        self.skip_whitespace();

        let default = if self.current_char() == Some('!') {
            self.advance();
            self.skip_whitespace();
            match self.current_char() {
                Some('"') | Some('\'') => Some(self.parse_quoted_string()?),
                _ => Some(String::new()),
            }
        } else {
            None
        };

        self.skip_whitespace();
        let end = self.position;
        self.expect_char('}')?;

        Ok(Interpolation {
            source: self.input[start..end].trim().to_string(),
            path,
            default,
        })
    }

    fn parse_path(&mut self) -> Result<Vec<PathSegment>, TemplateError> {
        let mut path = vec![PathSegment::Key(self.parse_identifier()?)];

        loop {
            match self.current_char() {
                Some('.') => {
                    self.advance();
                    path.push(PathSegment::Key(self.parse_identifier()?));
                }
                Some('[') => {
                    self.advance();
                    self.skip_whitespace();
                    let segment = match self.current_char() {
                        Some('"') | Some('\'') => PathSegment::Key(self.parse_quoted_string()?),
                        Some(ch) if ch.is_ascii_digit() => PathSegment::Index(self.parse_index()?),
                        _ => return Err(self.error("Expected an index or a quoted key after '['")),
                    };
                    self.skip_whitespace();
                    self.expect_char(']')?;
                    path.push(segment);
                }
                _ => return Ok(path),
            }
        }
    }

    fn parse_identifier(&mut self) -> Result<String, TemplateError> {
        let mut identifier = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if identifier.is_empty() {
            return Err(self.error("Expected a variable name"));
        }
        Ok(identifier)
    }

    fn parse_index(&mut self) -> Result<usize, TemplateError> {
        let mut digits = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        digits
            .parse()
            .map_err(|_| self.error(format!("Invalid index '{}'", digits)))
    }

    fn parse_quoted_string(&mut self) -> Result<String, TemplateError> {
        let quote_char = match self.advance() {
            Some(ch) => ch,
            None => return Err(self.error("Expected a string literal")),
        };

        let mut string = String::new();
        let mut escaped = false;

        while let Some(ch) = self.advance() {
            if escaped {
                match ch {
                    'n' => string.push('\n'),
                    't' => string.push('\t'),
                    other => string.push(other),
                }
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote_char {
                return Ok(string);
            } else {
                string.push(ch);
            }
        }

        Err(self.error("Unterminated string literal"))
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn current_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn expect_char(&mut self, expected: char) -> Result<(), TemplateError> {
        match self.current_char() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("Expected '{}' but found '{}'", expected, ch))),
            None => Err(self.error(format!("Expected '{}' but reached end of template", expected))),
        }
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::Parse {
            position: self.position,
            message: message.into(),
        }
    }
}
