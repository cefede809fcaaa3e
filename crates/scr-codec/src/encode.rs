//! Outbound message encoding.

use std::fmt;

use indexmap::IndexMap;

/// A single outbound value.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(value) => write!(f, "{value}"),
            // Debug keeps a fractional part or exponent (`1.0`, `1e-7`) and is
            // shortest round-trip, independent of any locale.
            Token::Float(value) => write!(f, "{value:?}"),
            Token::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for Token {
    fn from(value: f64) -> Self {
        Token::Float(value)
    }
}

impl From<f32> for Token {
    fn from(value: f32) -> Self {
        Token::Float(f64::from(value))
    }
}

impl From<i64> for Token {
    fn from(value: i64) -> Self {
        Token::Int(value)
    }
}

impl From<i32> for Token {
    fn from(value: i32) -> Self {
        Token::Int(i64::from(value))
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::Text(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::Text(value)
    }
}

/// Ordered set of outbound groups.
///
/// Values are optional: a group whose first value is absent, or which has no
/// values at all, is left out of the encoded text. This is how optional
/// outbound fields are included conditionally. Inside a group, encoding stops
/// at the first absent value so that later values never shift position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutboundMessage {
    groups: IndexMap<String, Vec<Option<Token>>>,
}

impl OutboundMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single-valued group.
    pub fn with(mut self, tag: impl Into<String>, value: impl Into<Token>) -> Self {
        self.push(tag, vec![Some(value.into())]);
        self
    }

    /// Add a multi-valued group.
    pub fn with_values<I, T>(mut self, tag: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        self.push(tag, values.into_iter().map(|v| Some(v.into())).collect());
        self
    }

    /// Insert or replace a group with possibly-absent values.
    pub fn push(&mut self, tag: impl Into<String>, values: Vec<Option<Token>>) {
        self.groups.insert(tag.into(), values);
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Option<Token>])> {
        self.groups
            .iter()
            .map(|(tag, values)| (tag.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn encode(&self) -> String {
        encode(self)
    }
}

/// Render a message as wire text.
pub fn encode(message: &OutboundMessage) -> String {
    let mut out = String::new();
    for (tag, values) in message.groups() {
        if !matches!(values.first(), Some(Some(_))) {
            continue;
        }
        out.push('(');
        out.push_str(tag);
        for value in values.iter().map_while(Option::as_ref) {
            out.push(' ');
            out.push_str(&value.to_string());
        }
        out.push(')');
    }
    out
}
