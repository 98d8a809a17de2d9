//! # Config Option Policies — Nested Value Resolution
//!
//! A [`ConfigOptionPolicy`] describes how to pull one datum out of a nested
//! mapping document:
//!
//! 1. No key path → the document itself is the value (identity policy).
//! 2. Walk the key path. A root that is not a mapping is a
//!    [`DocumentInvalidError`]; a missing key, or a non-mapping part way
//!    down, is a [`ConfigKeyError`].
//! 3. On a missing key, optional policies fall back to their default
//!    (parsed through the parser unless it is already resolved); required
//!    policies propagate the key error.
//! 4. A found value goes through the parser, if any. Any parser failure is
//!    a [`ConfigValueInvalidError`] carrying the raw value.
//! 5. If an allow-set is configured, the result must be a member.
//!
//! Optional policies never fail on a missing key; that invariant is what
//! lets one malformed field sit next to many healthy ones.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::ValidationContext;
use crate::error::{
    display_value, ConfigKeyError, ConfigValueInvalidError, DocumentInvalidError,
    ValidationError, VersionError,
};
use crate::parser::Parser;
use crate::value::Resolved;
use crate::version::SchemaVersion;

/// Shared surface of every policy: provenance, severity and a description
/// of what the policy accepts.
pub trait ValidationPolicy: fmt::Debug + Send + Sync {
    fn context(&self) -> &ValidationContext;

    fn is_error(&self) -> bool;

    /// Human-readable statement of what the policy accepts.
    fn render(&self) -> String;
}

// ─── Key Paths ───────────────────────────────────────────────────────

/// A single key, or an ordered sequence of keys for nested lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPath {
    Key(String),
    Nested(Vec<String>),
}

impl KeyPath {
    pub fn keys(&self) -> &[String] {
        match self {
            Self::Key(k) => std::slice::from_ref(k),
            Self::Nested(keys) => keys,
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys().join("/"))
    }
}

impl From<&str> for KeyPath {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for KeyPath {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(keys: [&str; N]) -> Self {
        Self::Nested(keys.iter().map(|k| (*k).to_string()).collect())
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(keys: Vec<String>) -> Self {
        Self::Nested(keys)
    }
}

// ─── Defaults ────────────────────────────────────────────────────────

/// What an optional policy yields when its key is absent.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// A raw document value, run through the parser like a found value.
    Raw(Value),
    /// A value already of the target type, returned verbatim.
    Resolved(Resolved),
}

// ─── Config Option Policy ────────────────────────────────────────────

/// Declarative description of how to resolve one configuration datum.
#[derive(Clone)]
pub struct ConfigOptionPolicy {
    context: ValidationContext,
    path: Option<KeyPath>,
    parser: Option<Parser>,
    required: bool,
    options: Option<Vec<Value>>,
    default: Option<DefaultValue>,
    is_error: bool,
}

impl ConfigOptionPolicy {
    /// A required, error-level policy reading `path`.
    pub fn new(context: ValidationContext, path: impl Into<KeyPath>) -> Self {
        Self {
            context,
            path: Some(path.into()),
            parser: None,
            required: true,
            options: None,
            default: None,
            is_error: true,
        }
    }

    /// A policy with no key path: resolution returns the document itself.
    pub fn identity(context: ValidationContext) -> Self {
        Self {
            path: None,
            ..Self::new(context, KeyPath::Nested(Vec::new()))
        }
    }

    pub fn parser(mut self, parser: Parser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Default for a missing key, parsed through the parser. Implies optional.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Raw(value.into()));
        self.optional()
    }

    /// Default already of the target type, returned as-is. Implies optional.
    pub fn default_resolved(mut self, value: impl Into<Resolved>) -> Self {
        self.default = Some(DefaultValue::Resolved(value.into()));
        self.optional()
    }

    /// Restrict resolved values to an allow-set.
    pub fn options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Report failures of this policy as warnings rather than errors.
    pub fn warning(mut self) -> Self {
        self.is_error = false;
        self
    }

    pub fn path(&self) -> Option<&KeyPath> {
        self.path.as_ref()
    }

    pub fn parser_ref(&self) -> Option<&Parser> {
        self.parser.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allowed_options(&self) -> Option<&[Value]> {
        self.options.as_deref()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// The key path as written in reports, `a/b/c`.
    pub fn format_path(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "(document)".to_string(), ToString::to_string)
    }

    /// `Valid options are a, b` when an allow-set is configured.
    pub fn options_description(&self) -> Option<String> {
        let options = self.options.as_ref()?;
        let rendered: Vec<String> = options.iter().map(display_value).collect();
        Some(format!("Valid options are {}", rendered.join(", ")))
    }

    /// Resolve this policy's datum out of `document`.
    pub fn get(self: &Arc<Self>, document: &Value) -> Result<Resolved, ValidationError> {
        let Some(path) = &self.path else {
            return Ok(Resolved::Value(document.clone()));
        };
        match self.lookup(path, document) {
            Ok(raw) => self.resolve_found(raw),
            Err(e) if e.is_key_missing() && !self.required => self.resolve_default(),
            Err(e) => Err(e),
        }
    }

    fn lookup<'d>(
        self: &Arc<Self>,
        path: &KeyPath,
        document: &'d Value,
    ) -> Result<&'d Value, ValidationError> {
        if !document.is_object() {
            return Err(DocumentInvalidError::new(Arc::clone(self), document).into());
        }
        path.keys()
            .iter()
            .try_fold(document, |node, key| node.as_object().and_then(|m| m.get(key)))
            .ok_or_else(|| ConfigKeyError::new(Arc::clone(self)).into())
    }

    fn resolve_found(self: &Arc<Self>, raw: &Value) -> Result<Resolved, ValidationError> {
        let resolved = match &self.parser {
            Some(parser) => parser
                .parse(raw, &self.context)
                .map_err(|_| ConfigValueInvalidError::new(Arc::clone(self), raw.clone()))?,
            None => Resolved::Value(raw.clone()),
        };

        match &self.options {
            Some(options) if !options.iter().any(|o| resolved.matches_option(o)) => {
                Err(ConfigValueInvalidError::new(Arc::clone(self), raw.clone()).into())
            }
            _ => Ok(resolved),
        }
    }

    fn resolve_default(self: &Arc<Self>) -> Result<Resolved, ValidationError> {
        match (&self.default, &self.parser) {
            (None, _) => Ok(Resolved::none()),
            (Some(DefaultValue::Resolved(r)), _) => Ok(r.clone()),
            (Some(DefaultValue::Raw(v)), None) => Ok(Resolved::Value(v.clone())),
            (Some(DefaultValue::Raw(Value::Null)), Some(_)) => Ok(Resolved::none()),
            (Some(DefaultValue::Raw(v)), Some(parser)) => parser
                .parse(v, &self.context)
                .map_err(|_| ConfigValueInvalidError::new(Arc::clone(self), v.clone()).into()),
        }
    }
}

impl ValidationPolicy for ConfigOptionPolicy {
    fn context(&self) -> &ValidationContext {
        &self.context
    }

    fn is_error(&self) -> bool {
        self.is_error
    }

    fn render(&self) -> String {
        self.options_description()
            .unwrap_or_else(|| format!("Expects {}", self.format_path()))
    }
}

impl fmt::Debug for ConfigOptionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOptionPolicy")
            .field("context", &self.context.render())
            .field("path", &self.format_path())
            .field("parser", &self.parser.as_ref().map(Parser::name))
            .field("required", &self.required)
            .field("options", &self.options)
            .field("is_error", &self.is_error)
            .finish()
    }
}

// ─── Schema Policy ───────────────────────────────────────────────────

/// Accepts a `(name, version)` pair iff the name matches exactly and the
/// version lies in `[version_min, version_max]`, inclusive.
#[derive(Debug, Clone)]
pub struct SchemaPolicy {
    context: ValidationContext,
    name: String,
    version_min: SchemaVersion,
    version_max: SchemaVersion,
    is_error: bool,
}

impl SchemaPolicy {
    /// Fails with [`VersionError::InvalidRange`] when `version_min > version_max`.
    pub fn new(
        context: ValidationContext,
        name: impl Into<String>,
        version_min: SchemaVersion,
        version_max: SchemaVersion,
    ) -> Result<Self, VersionError> {
        if version_min > version_max {
            return Err(VersionError::InvalidRange {
                min: version_min.to_string(),
                max: version_max.to_string(),
            });
        }
        Ok(Self {
            context,
            name: name.into(),
            version_min,
            version_max,
            is_error: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_min(&self) -> &SchemaVersion {
        &self.version_min
    }

    pub fn version_max(&self) -> &SchemaVersion {
        &self.version_max
    }

    pub fn validate(&self, name: &str, version: &SchemaVersion) -> bool {
        name == self.name && &self.version_min <= version && version <= &self.version_max
    }
}

impl ValidationPolicy for SchemaPolicy {
    fn context(&self) -> &ValidationContext {
        &self.context
    }

    fn is_error(&self) -> bool {
        self.is_error
    }

    fn render(&self) -> String {
        format!(
            "Supports {}<={}<={}",
            self.version_min, self.name, self.version_max
        )
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> impl Strategy<Value = String> {
        "[a-z]{1,6}"
    }

    proptest! {
        /// An optional policy never fails for a missing key, whatever the mapping holds.
        #[test]
        fn optional_policy_never_raises_on_missing_key(
            keys in prop::collection::vec(key(), 1..4),
            present in prop::collection::btree_map(key(), any::<i64>(), 0..6),
        ) {
            let mut document = serde_json::Map::new();
            for (k, v) in present {
                document.insert(k, Value::from(v));
            }
            let document = Value::Object(document);
            let policy = Arc::new(
                ConfigOptionPolicy::new(ValidationContext::new("p.yaml"), keys)
                    .parser(Parser::integer())
                    .default(7),
            );
            let result = policy.get(&document);
            prop_assert!(result.is_ok(), "optional policy raised: {:?}", result.err());
        }
    }
}
