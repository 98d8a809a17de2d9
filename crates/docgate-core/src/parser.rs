//! # Value Parsers
//!
//! A [`Parser`] turns a raw document value into a [`Resolved`] value.
//! Three shapes exist:
//!
//! - plain unary transforms (`string`, `integer`, `version`, `custom`, ...),
//! - nested builders that construct a validatable object from the raw value
//!   and a child [`ValidationContext`] named after the parser,
//! - ordered candidate lists, where the first parser that accepts the value
//!   wins.
//!
//! Every failure is a [`ParseError`]; the owning policy converts it into a
//! `ConfigValueInvalidError` carrying the raw value.

use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};

use crate::context::ValidationContext;
use crate::error::ParseError;
use crate::value::{Resolved, ResolvedObject};
use crate::version::SchemaVersion;

type ParseFn = dyn Fn(&Value, &ValidationContext) -> Result<Resolved, ParseError> + Send + Sync;

#[derive(Clone)]
enum ParserKind {
    Transform(Arc<ParseFn>),
    Candidates(Vec<Parser>),
}

/// A named value parser.
#[derive(Clone)]
pub struct Parser {
    name: String,
    kind: ParserKind,
}

impl Parser {
    fn transform<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &ValidationContext) -> Result<Resolved, ParseError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: ParserKind::Transform(Arc::new(f)),
        }
    }

    /// A plain transform producing a document value.
    pub fn custom<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ParseError> + Send + Sync + 'static,
    {
        Self::transform(name, move |value, _| f(value).map(Resolved::Value))
    }

    /// A builder for a nested validatable object. The builder receives a
    /// context child named after this parser.
    pub fn nested<O, F>(name: impl Into<String>, build: F) -> Self
    where
        O: ResolvedObject,
        F: Fn(&Value, &ValidationContext) -> Result<O, ParseError> + Send + Sync + 'static,
    {
        Self::transform(name, move |value, ctx| build(value, ctx).map(Resolved::object))
    }

    /// Try each parser in order and keep the first success.
    pub fn candidates(parsers: impl IntoIterator<Item = Parser>) -> Self {
        let parsers: Vec<Parser> = parsers.into_iter().collect();
        let name = parsers
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join("|");
        Self {
            name,
            kind: ParserKind::Candidates(parsers),
        }
    }

    /// Scalars rendered as text. Mappings, sequences and null are rejected.
    pub fn string() -> Self {
        Self::custom("str", |value| match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(ParseError::new(format!("expected text, got {other}"))),
        })
    }

    /// Whole numbers, from integers, integral floats or numeric text.
    pub fn integer() -> Self {
        Self::custom("int", |value| {
            let parsed = match value {
                Value::Number(n) => n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| f as i64)
                }),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| ParseError::new(format!("expected an integer, got {value}")))
        })
    }

    /// Finite floating point numbers, from numbers or numeric text.
    pub fn float() -> Self {
        Self::custom("float", |value| {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| ParseError::new(format!("expected a number, got {value}")))
        })
    }

    /// Booleans, or the usual yes/no spellings as text.
    pub fn boolean() -> Self {
        Self::custom("bool", |value| match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
                _ => Err(ParseError::new(format!("expected a boolean, got {s:?}"))),
            },
            other => Err(ParseError::new(format!("expected a boolean, got {other}"))),
        })
    }

    /// Text given either as one string or as a sequence of lines.
    pub fn multiline() -> Self {
        Self::custom("multiline", |value| match value {
            Value::String(_) => Ok(value.clone()),
            Value::Array(lines) => lines
                .iter()
                .map(|l| {
                    l.as_str()
                        .ok_or_else(|| ParseError::new(format!("expected a line of text, got {l}")))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|lines| Value::String(lines.join("\n"))),
            other => Err(ParseError::new(format!("expected text or lines, got {other}"))),
        })
    }

    /// Exact decimal schema versions.
    pub fn version() -> Self {
        Self::transform("Decimal", |value, _| {
            SchemaVersion::from_value(value)
                .map(Resolved::Version)
                .map_err(ParseError::from)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the parser. `context` is the owning policy's context; nested
    /// builders receive a child of it named after the parser that runs.
    pub fn parse(&self, value: &Value, context: &ValidationContext) -> Result<Resolved, ParseError> {
        match &self.kind {
            ParserKind::Transform(f) => f(value, &context.child(self.name.as_str())),
            ParserKind::Candidates(parsers) => parsers
                .iter()
                .find_map(|p| p.parse(value, context).ok())
                .ok_or_else(|| {
                    ParseError::new(format!("no candidate parser in [{}] accepted {value}", self.name))
                }),
        }
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Parser").field(&self.name).finish()
    }
}
