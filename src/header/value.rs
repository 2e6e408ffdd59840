//! Header attribute values and the `{item, item, ...}` list grammar.
//!
//! ```text
//! List  := '{' Items '}'
//! Items := '' | Item (',' Item)*
//! Item  := List | Scalar
//! ```
//!
//! Scalar items are tried as an integer, then a float, and otherwise kept as a
//! trimmed string. An empty item between two commas is an empty string.

use std::fmt;

use crate::error::{EnviError, Result};

/// A single header attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// Integer scalar
    Int(i64),
    /// Floating point scalar
    Float(f64),
    /// Anything else
    Str(String),
    /// Brace-delimited list, possibly nested
    List(Vec<HeaderValue>),
}

impl HeaderValue {
    /// Parse one list item: integer, then float, then trimmed string.
    pub fn parse_scalar(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            Self::Int(i)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            Self::Float(f)
        } else {
            Self::Str(trimmed.to_string())
        }
    }

    /// Integer view of the value. Strings holding an integer also qualify.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Float view of the value. Strings holding a number also qualify.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Str(s) => s.trim().parse().ok(),
            Self::List(_) => None,
        }
    }

    /// String view of a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a list value.
    pub fn as_list(&self) -> Option<&[HeaderValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Number of items if this is a list.
    pub fn list_len(&self) -> Option<usize> {
        self.as_list().map(<[HeaderValue]>::len)
    }

    /// List items as floats; fails on the first non-numeric item.
    pub fn to_float_vec(&self) -> Option<Vec<f64>> {
        self.as_list()?.iter().map(Self::as_float).collect()
    }

    /// List items as integers; fails on the first non-integer item.
    pub fn to_int_vec(&self) -> Option<Vec<i64>> {
        self.as_list()?.iter().map(Self::as_int).collect()
    }

    /// List items rendered as strings.
    pub fn to_string_vec(&self) -> Option<Vec<String>> {
        Some(self.as_list()?.iter().map(|v| v.to_string()).collect())
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps a decimal point so the value re-parses as a float
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => f.write_str(&format_list(items)),
        }
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for HeaderValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for HeaderValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<HeaderValue>> From<Vec<T>> for HeaderValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Parse a brace-delimited list.
pub fn parse_list(text: &str) -> Result<Vec<HeaderValue>> {
    let mut parser = ListParser {
        text: text.trim(),
        pos: 0,
    };
    let items = parser.list()?;
    parser.skip_whitespace();
    if parser.pos != parser.text.len() {
        return Err(EnviError::list_syntax(text, "trailing characters after list"));
    }
    Ok(items)
}

/// Render items with the list grammar, nesting as needed.
///
/// The grammar has no text for a list whose only item is an empty string:
/// `[""]` renders as `{}` and parses back as an empty list. Empty strings
/// next to at least one other item survive, since the commas mark them.
pub fn format_list(items: &[HeaderValue]) -> String {
    let inner: Vec<String> = items.iter().map(HeaderValue::to_string).collect();
    format!("{{{}}}", inner.join(", "))
}

struct ListParser<'a> {
    text: &'a str,
    pos: usize,
}

impl ListParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> EnviError {
        EnviError::list_syntax(self.text, format!("{message} at offset {}", self.pos))
    }

    fn list(&mut self) -> Result<Vec<HeaderValue>> {
        self.skip_whitespace();
        if self.bump() != Some(b'{') {
            return Err(self.error("expected '{'"));
        }
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.item()?);
            self.skip_whitespace();
            match self.bump() {
                Some(b',') => continue,
                Some(b'}') => return Ok(items),
                Some(_) => return Err(self.error("expected ',' or '}'")),
                None => return Err(self.error("unbalanced braces")),
            }
        }
    }

    fn item(&mut self) -> Result<HeaderValue> {
        self.skip_whitespace();
        if self.peek() == Some(b'{') {
            return Ok(HeaderValue::List(self.list()?));
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                b',' | b'}' => break,
                b'{' => return Err(self.error("unexpected '{' inside scalar")),
                _ => self.pos += 1,
            }
        }
        // Delimiters are ASCII so `start..pos` falls on char boundaries
        Ok(HeaderValue::parse_scalar(&self.text[start..self.pos]))
    }
}
