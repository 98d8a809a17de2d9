//! # Error Types — Validation Error Taxonomy
//!
//! Every validation error carries an `Arc` to the policy that raised it,
//! so a report can always say *which* datum failed and *where* it lives.
//!
//! ## Taxonomy
//!
//! - [`ConfigKeyError`]: a required key path is absent.
//! - [`ConfigValueInvalidError`]: a value was found but failed parsing or
//!   an allow-set membership check. Carries the offending value.
//! - [`DocumentInvalidError`]: the document handed to a policy is not a
//!   mapping at all (empty file, bare scalar, mangled content). Kept apart
//!   from a missing key so diagnostics can tell the two situations apart.
//! - [`SchemaNotSupportedError`]: an observed schema `(name, version)` is
//!   outside what a processor supports, or the name is not registered.
//!
//! ## Rendering
//!
//! [`ValidationError::render`] produces an [`ErrorReport`]
//! `{is_error, group, headline, detail}`. That report is the contract for
//! external reporting tools; the Rust type names are not.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::policy::{ConfigOptionPolicy, ValidationPolicy};

/// Structured, tool-facing rendering of a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// `false` for warning-level policies.
    pub is_error: bool,
    /// Stable error category heading.
    pub group: String,
    /// One-line summary naming the datum and its provenance.
    pub headline: String,
    /// Longer explanation, including valid options when known.
    pub detail: String,
}

// ─── Individual Errors ───────────────────────────────────────────────

/// A required configuration key path is absent from the document.
#[derive(Error, Debug, Clone)]
#[error("{} missing in {}", .policy.format_path(), .policy.context())]
pub struct ConfigKeyError {
    policy: Arc<ConfigOptionPolicy>,
}

impl ConfigKeyError {
    pub fn new(policy: Arc<ConfigOptionPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ConfigOptionPolicy {
        &self.policy
    }

    pub fn render(&self) -> ErrorReport {
        ErrorReport {
            is_error: self.policy.is_error(),
            group: "Configuration Key Missing".to_string(),
            headline: format!(
                "{} missing in {}",
                self.policy.format_path(),
                self.policy.context()
            ),
            detail: with_options(
                "This required configuration option could not be found in the configs file.",
                &self.policy,
            ),
        }
    }
}

/// A value was present but rejected by its parser or allow-set.
#[derive(Error, Debug, Clone)]
#[error("'{}' invalid for {} in {}", display_value(.value), .policy.format_path(), .policy.context())]
pub struct ConfigValueInvalidError {
    policy: Arc<ConfigOptionPolicy>,
    value: Value,
}

impl ConfigValueInvalidError {
    pub fn new(policy: Arc<ConfigOptionPolicy>, value: Value) -> Self {
        Self { policy, value }
    }

    pub fn policy(&self) -> &ConfigOptionPolicy {
        &self.policy
    }

    /// The offending raw value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn render(&self) -> ErrorReport {
        ErrorReport {
            is_error: self.policy.is_error(),
            group: "Configuration Value Unrecognized".to_string(),
            headline: format!(
                "'{}' Invalid for {} in {}",
                display_value(&self.value),
                self.policy.format_path(),
                self.policy.context()
            ),
            detail: with_options(
                "The value provided for this configuration option is unrecognized or not allowed in this context.",
                &self.policy,
            ),
        }
    }
}

/// The document a policy was asked to read is not a mapping.
#[derive(Error, Debug, Clone)]
#[error("expected a mapping to read {} in {}, got {found}", .policy.format_path(), .policy.context())]
pub struct DocumentInvalidError {
    policy: Arc<ConfigOptionPolicy>,
    found: String,
}

impl DocumentInvalidError {
    pub fn new(policy: Arc<ConfigOptionPolicy>, document: &Value) -> Self {
        Self {
            policy,
            found: value_kind(document).to_string(),
        }
    }

    pub fn policy(&self) -> &ConfigOptionPolicy {
        &self.policy
    }

    /// Kind of value found where a mapping was expected (`null`, `string`, ...).
    pub fn found(&self) -> &str {
        &self.found
    }

    pub fn render(&self) -> ErrorReport {
        ErrorReport {
            is_error: self.policy.is_error(),
            group: "Configuration Document Unreadable".to_string(),
            headline: format!(
                "Expected a mapping to read {} in {}, got {}",
                self.policy.format_path(),
                self.policy.context(),
                self.found
            ),
            detail: "The document is empty or unrecognizably mangled.".to_string(),
        }
    }
}

/// An observed schema declaration is not supported.
#[derive(Error, Debug, Clone)]
#[error("unsupported schema {value} in {}", .policy.context())]
pub struct SchemaNotSupportedError {
    policy: Arc<dyn ValidationPolicy>,
    value: String,
}

impl SchemaNotSupportedError {
    pub fn new(policy: Arc<dyn ValidationPolicy>, value: impl Into<String>) -> Self {
        Self {
            policy,
            value: value.into(),
        }
    }

    pub fn policy(&self) -> &dyn ValidationPolicy {
        self.policy.as_ref()
    }

    /// The observed declaration, e.g. `Project v0.9`.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn render(&self) -> ErrorReport {
        ErrorReport {
            is_error: self.policy.is_error(),
            group: "The file specifies a schema which is not supported.".to_string(),
            headline: format!("Got {} in {}", self.value, self.policy.context()),
            detail: self.policy.render(),
        }
    }
}

// ─── Taxonomy ────────────────────────────────────────────────────────

/// Any validation error raised while resolving or checking a document.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("configuration key missing: {0}")]
    ConfigKey(#[from] ConfigKeyError),

    #[error("configuration value invalid: {0}")]
    ConfigValueInvalid(#[from] ConfigValueInvalidError),

    #[error("configuration document unreadable: {0}")]
    DocumentInvalid(#[from] DocumentInvalidError),

    #[error("schema not supported: {0}")]
    SchemaNotSupported(#[from] SchemaNotSupportedError),
}

impl ValidationError {
    pub fn render(&self) -> ErrorReport {
        match self {
            Self::ConfigKey(e) => e.render(),
            Self::ConfigValueInvalid(e) => e.render(),
            Self::DocumentInvalid(e) => e.render(),
            Self::SchemaNotSupported(e) => e.render(),
        }
    }

    /// Whether the originating policy treats this as an error (vs. a warning).
    pub fn is_error(&self) -> bool {
        match self {
            Self::ConfigKey(e) => e.policy.is_error(),
            Self::ConfigValueInvalid(e) => e.policy.is_error(),
            Self::DocumentInvalid(e) => e.policy.is_error(),
            Self::SchemaNotSupported(e) => e.policy.is_error(),
        }
    }

    /// True for the key-missing case, which optional policies turn into defaults.
    pub fn is_key_missing(&self) -> bool {
        matches!(self, Self::ConfigKey(_))
    }
}

// ─── Accumulated Errors ──────────────────────────────────────────────

/// The non-fatal error set attached to a processed object.
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: impl Into<ValidationError>) {
        self.errors.push(error.into());
    }

    /// Merge another set into this one, preserving order.
    pub fn merge(&mut self, other: &ValidationErrors) {
        self.errors.extend(other.errors.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of error-level entries.
    pub fn terrors(&self) -> usize {
        self.errors.iter().filter(|e| e.is_error()).count()
    }

    /// Number of warning-level entries.
    pub fn twarnings(&self) -> usize {
        self.errors.len() - self.terrors()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    pub fn render(&self) -> Vec<ErrorReport> {
        self.errors.iter().map(ValidationError::render).collect()
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {e}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl Extend<ValidationError> for ValidationErrors {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

// ─── Parse & Version Errors ──────────────────────────────────────────

/// A value parser rejected its input.
///
/// Policies convert this into [`ConfigValueInvalidError`] carrying the
/// raw value; the message is for logs and debugging only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ParseError(pub String);

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<VersionError> for ParseError {
    fn from(e: VersionError) -> Self {
        Self(e.to_string())
    }
}

/// A schema version string could not be read as a decimal, or a version
/// range is inverted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("empty version")]
    Empty,

    #[error("malformed decimal version: {0:?}")]
    Malformed(String),

    #[error("version out of range: {0:?}")]
    OutOfRange(String),

    #[error("value is not a version: {0}")]
    NotAVersion(String),

    /// A supported range whose lower bound exceeds its upper bound.
    #[error("version_min {min} is greater than version_max {max}")]
    InvalidRange { min: String, max: String },
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Render a value the way a user wrote it: strings bare, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

fn with_options(detail: &str, policy: &ConfigOptionPolicy) -> String {
    match policy.options_description() {
        Some(options) => format!("{detail} {options}"),
        None => detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ValidationContext;
    use serde_json::json;

    fn policy() -> Arc<ConfigOptionPolicy> {
        Arc::new(
            ConfigOptionPolicy::new(ValidationContext::new("cfg.yaml"), ["db", "engine"])
                .options(["sqlite", "postgres"]),
        )
    }

    #[test]
    fn test_key_error_render() {
        let report = ConfigKeyError::new(policy()).render();
        assert!(report.is_error);
        assert_eq!(report.group, "Configuration Key Missing");
        assert_eq!(report.headline, "db/engine missing in cfg.yaml");
        assert!(report.detail.ends_with("Valid options are sqlite, postgres"));
    }

    #[test]
    fn test_value_invalid_render_carries_value() {
        let err = ConfigValueInvalidError::new(policy(), json!("mysql"));
        assert_eq!(err.value(), &json!("mysql"));
        let report = err.render();
        assert_eq!(report.group, "Configuration Value Unrecognized");
        assert_eq!(report.headline, "'mysql' Invalid for db/engine in cfg.yaml");
    }

    #[test]
    fn test_document_invalid_is_distinct_from_key_missing() {
        let err: ValidationError = DocumentInvalidError::new(policy(), &Value::Null).into();
        assert!(!err.is_key_missing());
        let report = err.render();
        assert_eq!(report.group, "Configuration Document Unreadable");
        assert!(report.headline.contains("got null"));
    }

    #[test]
    fn test_collection_counts() {
        let warn = Arc::new(
            ConfigOptionPolicy::new(ValidationContext::new("cfg.yaml"), "name").warning(),
        );
        let mut errors = ValidationErrors::new();
        errors.add(ConfigKeyError::new(policy()));
        errors.add(ConfigKeyError::new(warn));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.terrors(), 1);
        assert_eq!(errors.twarnings(), 1);

        let mut parent = ValidationErrors::new();
        parent.merge(&errors);
        assert_eq!(parent.render().len(), 2);
        assert!(parent.to_string().contains("db/engine missing"));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("x")), "x");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
