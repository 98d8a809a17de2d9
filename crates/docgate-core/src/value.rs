//! # Resolved Values
//!
//! A policy resolves a raw document datum into a [`Resolved`] value: a
//! plain (possibly coerced) document value, an exact decimal
//! [`SchemaVersion`], or a nested validatable object such as a schema
//! sub-object or a typed collection.
//!
//! Nested objects are held behind `Arc<dyn ResolvedObject>` so resolved
//! values stay cheap to clone into memo slots. Callers recover the
//! concrete type with [`Resolved::downcast_ref`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{display_value, ValidationErrors};
use crate::version::SchemaVersion;

static NO_ERRORS: ValidationErrors = ValidationErrors::new();

/// Anything that accumulates validation errors while it is built.
///
/// Parents merge the errors of every validatable child they resolve, so
/// error aggregation is transitive through nested objects and collections.
pub trait Validatable {
    fn validation_errors(&self) -> &ValidationErrors;

    /// True when no error-level entries were recorded. Warnings do not count.
    fn is_valid(&self) -> bool {
        self.validation_errors().terrors() == 0
    }
}

impl Validatable for Value {
    fn validation_errors(&self) -> &ValidationErrors {
        &NO_ERRORS
    }
}

impl Validatable for String {
    fn validation_errors(&self) -> &ValidationErrors {
        &NO_ERRORS
    }
}

impl Validatable for SchemaVersion {
    fn validation_errors(&self) -> &ValidationErrors {
        &NO_ERRORS
    }
}

/// A nested object that can live inside a [`Resolved`] value.
pub trait ResolvedObject: Validatable + fmt::Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T> ResolvedObject for T
where
    T: Validatable + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The outcome of resolving one declared attribute.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A document value, coerced by the policy's parser if one was set.
    Value(Value),
    /// An exact decimal schema version.
    Version(SchemaVersion),
    /// A nested validatable object (schema sub-object, collection, ...).
    Object(Arc<dyn ResolvedObject>),
}

impl Resolved {
    /// The "no value" result an optional policy yields without a default.
    pub fn none() -> Self {
        Self::Value(Value::Null)
    }

    pub fn object(object: impl ResolvedObject) -> Self {
        Self::Object(Arc::new(object))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn as_version(&self) -> Option<&SchemaVersion> {
        match self {
            Self::Version(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&dyn ResolvedObject> {
        match self {
            Self::Object(o) => Some(o.as_ref()),
            _ => None,
        }
    }

    /// Recover a nested object's concrete type.
    pub fn downcast_ref<T: ResolvedObject>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Validation errors carried by a nested object, if this is one.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        self.as_object().map(|o| o.validation_errors())
    }

    /// Whether this value equals an entry of an allow-set. Numbers compare
    /// by value, so `1.0` matches an option written as `1`.
    pub fn matches_option(&self, option: &Value) -> bool {
        match self {
            Self::Value(v) => values_equal(v, option),
            Self::Version(v) => SchemaVersion::from_value(option).is_ok_and(|o| &o == v),
            Self::Object(_) => false,
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        _ => a == b,
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.write_str(&display_value(v)),
            Self::Version(v) => write!(f, "{v}"),
            Self::Object(o) => write!(f, "{o:?}"),
        }
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<SchemaVersion> for Resolved {
    fn from(version: SchemaVersion) -> Self {
        Self::Version(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Widget {
        errors: ValidationErrors,
    }

    impl Validatable for Widget {
        fn validation_errors(&self) -> &ValidationErrors {
            &self.errors
        }
    }

    #[test]
    fn test_scalar_accessors() {
        let r = Resolved::from(json!("abc"));
        assert_eq!(r.as_str(), Some("abc"));
        assert!(r.as_i64().is_none());
        assert!(Resolved::none().is_none());
        assert_eq!(Resolved::from(json!(7)).as_i64(), Some(7));
    }

    #[test]
    fn test_downcast_object() {
        let r = Resolved::object(Widget {
            errors: ValidationErrors::new(),
        });
        assert!(r.downcast_ref::<Widget>().is_some());
        assert!(r.downcast_ref::<String>().is_none());
        assert!(r.validation_errors().is_some_and(ValidationErrors::is_empty));
    }

    #[test]
    fn test_version_matches_numeric_option() {
        let r = Resolved::from(SchemaVersion::parse("1.10").unwrap());
        assert!(r.matches_option(&json!(1.1)));
        assert!(r.matches_option(&json!("1.1")));
        assert!(!r.matches_option(&json!("1.2")));
    }
}
