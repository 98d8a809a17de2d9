//! # Schema-Controlled Documents
//!
//! A schema-controlled document is a processor whose raw content declares
//! the schema it implements:
//!
//! ```yaml
//! schema:
//!   name: Project
//!   version: 1.2
//! ```
//!
//! Every such document carries two mandatory attributes ahead of its own
//! declarations, `schema_name` and `schema_version`, plus the synthetic
//! `schema_policy` gate after them. Once the attributes are resolved the
//! declaration is checked against the type's [`SchemaSupport`]:
//!
//! - a wildcard name (`*`) skips the check entirely;
//! - a declared legacy name is rewritten in memory to the supported name;
//! - a mismatch (or an absent declaration) is a [`SchemaNotSupportedError`],
//!   recorded in non-strict mode and returned as an error in strict mode.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docgate_core::{
    Parser, Resolved, SchemaNotSupportedError, SchemaPolicy, SchemaVersion, Validatable,
    ValidationContext, ValidationErrors, VersionError,
};
use serde_json::Value;
use tracing::debug;

use crate::error::SchemaError;
use crate::processor::{warn_on_errors, Elements, Policy, SchemaProcessor};
use crate::source::DocumentLoader;

/// Attribute holding the declared schema name.
pub const SCHEMA_NAME: &str = "schema_name";
/// Attribute holding the declared schema version.
pub const SCHEMA_VERSION: &str = "schema_version";
/// Synthetic gate attribute.
pub const SCHEMA_POLICY: &str = "schema_policy";

// ─── Support Declaration ─────────────────────────────────────────────

/// What a document type accepts, and how to create a missing document.
///
/// The version range is checked once, at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSupport {
    /// Supported schema name, or [`SchemaSupport::WILDCARD`].
    pub name: String,
    version_min: SchemaVersion,
    version_max: SchemaVersion,
    /// An older name accepted in place of `name`.
    pub legacy_name: Option<String>,
    /// Stub template rendered when the document is absent.
    pub template: Option<PathBuf>,
    /// Fail with `DocumentNotFound` when the document is still absent after
    /// stub generation, instead of reading it as empty content.
    pub require_exists: bool,
}

impl SchemaSupport {
    pub const WILDCARD: &'static str = "*";

    /// Parse both bounds and check the range.
    pub fn new(
        name: impl Into<String>,
        version_min: &str,
        version_max: &str,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let invalid = |reason: String| SchemaError::InvalidDeclaration {
            name: name.clone(),
            reason,
        };
        let min = SchemaVersion::parse(version_min)
            .map_err(|e| invalid(format!("version_min: {e}")))?;
        let max = SchemaVersion::parse(version_max)
            .map_err(|e| invalid(format!("version_max: {e}")))?;
        Self::with_range(name, min, max)
    }

    /// Build from already-parsed bounds. Fails when `min > max`.
    pub fn with_range(
        name: impl Into<String>,
        version_min: SchemaVersion,
        version_max: SchemaVersion,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if version_min > version_max {
            let reason = VersionError::InvalidRange {
                min: version_min.to_string(),
                max: version_max.to_string(),
            };
            return Err(SchemaError::InvalidDeclaration {
                name,
                reason: reason.to_string(),
            });
        }
        Ok(Self::unchecked(name, version_min, version_max))
    }

    fn unchecked(name: String, version_min: SchemaVersion, version_max: SchemaVersion) -> Self {
        Self {
            name,
            version_min,
            version_max,
            legacy_name: None,
            template: None,
            require_exists: true,
        }
    }

    /// Accepts any declaration. Used for the dispatch-only first pass.
    pub fn wildcard() -> Self {
        Self::unchecked(
            Self::WILDCARD.to_string(),
            SchemaVersion::from(0),
            SchemaVersion::from(0),
        )
    }

    pub fn version_min(&self) -> &SchemaVersion {
        &self.version_min
    }

    pub fn version_max(&self) -> &SchemaVersion {
        &self.version_max
    }

    pub fn legacy_name(mut self, name: impl Into<String>) -> Self {
        self.legacy_name = Some(name.into());
        self
    }

    pub fn template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn require_exists(mut self, require: bool) -> Self {
        self.require_exists = require;
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == Self::WILDCARD
    }

    /// Build the version gate for this declaration.
    pub fn policy(&self, context: &ValidationContext) -> Result<SchemaPolicy, SchemaError> {
        SchemaPolicy::new(
            context.clone(),
            self.name.clone(),
            self.version_min.clone(),
            self.version_max.clone(),
        )
        .map_err(|e| SchemaError::InvalidDeclaration {
            name: self.name.clone(),
            reason: e.to_string(),
        })
    }

    fn context_for(&self, root: impl Into<String>) -> ValidationContext {
        let context = ValidationContext::new(root);
        if self.is_wildcard() {
            context
        } else {
            context.with_locality(self.name.clone())
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────

/// A processed document together with its schema declaration check.
pub struct SchemaControlledDocument {
    path: Option<PathBuf>,
    support: SchemaSupport,
    processor: SchemaProcessor,
}

impl SchemaControlledDocument {
    /// Load the document at `path` and process it.
    ///
    /// `declare` adds the type's own attributes on top of the mandatory
    /// schema attributes.
    pub fn open(
        loader: &DocumentLoader,
        path: &Path,
        support: &SchemaSupport,
        declare: fn(&mut Elements),
        strict: bool,
    ) -> Result<Self, SchemaError> {
        let context = support.context_for(path.display().to_string());
        let raw = loader.load(path, support)?;
        let mut document = Self::build(raw, context, support, declare, strict)?;
        document.path = Some(path.to_path_buf());
        Ok(document)
    }

    /// Process an already-parsed document.
    pub fn from_content(
        content: Value,
        context: ValidationContext,
        support: &SchemaSupport,
        declare: fn(&mut Elements),
        strict: bool,
    ) -> Result<Self, SchemaError> {
        Self::build(content, context, support, declare, strict)
    }

    fn build(
        raw: Value,
        context: ValidationContext,
        support: &SchemaSupport,
        declare: fn(&mut Elements),
        strict: bool,
    ) -> Result<Self, SchemaError> {
        let gate = support.policy(&context)?;

        let mut elements = Elements::new(context);
        elements.insert(SCHEMA_NAME, elements.option(["schema", "name"]));
        elements.insert(
            SCHEMA_VERSION,
            elements.option(["schema", "version"]).parser(Parser::version()),
        );
        declare(&mut elements);
        elements.insert_schema(SCHEMA_POLICY, gate);

        let mut processor = SchemaProcessor::new(support.name.clone(), raw, elements);
        processor.process();

        let mut document = Self {
            path: None,
            support: support.clone(),
            processor,
        };
        if let Err(e) = document.verify_schema_declaration() {
            if strict {
                return Err(e.into());
            }
            document.processor.record(e);
        }
        warn_on_errors(&document.support.name, &document.processor);
        Ok(document)
    }

    fn verify_schema_declaration(&mut self) -> Result<(), SchemaNotSupportedError> {
        if self.support.is_wildcard() {
            return Ok(());
        }
        let gate = match self.processor.policy(SCHEMA_POLICY) {
            Some(Policy::Schema(gate)) => Arc::clone(gate),
            _ => return Ok(()),
        };

        let legacy = self.support.legacy_name.as_deref();
        if legacy.is_some() && self.schema_name() == legacy {
            let supported = Value::String(self.support.name.clone());
            self.processor.bind(SCHEMA_NAME, Resolved::from(supported));
        }

        let name = self.schema_name().map(str::to_string);
        let version = self.schema_version().cloned();
        debug!(
            schema = name.as_deref().unwrap_or("(undeclared)"),
            version = %version.as_ref().map_or_else(|| "(undeclared)".to_string(), ToString::to_string),
            "validating schema policy"
        );

        match (name, version) {
            (Some(name), Some(version)) if gate.validate(&name, &version) => Ok(()),
            (name, version) => {
                let observed = format!(
                    "{} v{}",
                    name.as_deref().unwrap_or("(undeclared)"),
                    version.map_or_else(|| "(undeclared)".to_string(), |v| v.to_string())
                );
                Err(SchemaNotSupportedError::new(gate, observed))
            }
        }
    }

    /// Source path, when loaded from one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn support(&self) -> &SchemaSupport {
        &self.support
    }

    /// The declared schema name, after any legacy rewrite.
    pub fn schema_name(&self) -> Option<&str> {
        self.processor.get(SCHEMA_NAME).ok().and_then(Resolved::as_str)
    }

    pub fn schema_version(&self) -> Option<&SchemaVersion> {
        self.processor
            .get(SCHEMA_VERSION)
            .ok()
            .and_then(Resolved::as_version)
    }

    /// Resolve a declared attribute.
    pub fn get(&self, name: &str) -> Result<&Resolved, SchemaError> {
        self.processor.get(name)
    }

    pub fn processor(&self) -> &SchemaProcessor {
        &self.processor
    }

    pub fn errors(&self) -> &ValidationErrors {
        self.processor.errors()
    }
}

impl Validatable for SchemaControlledDocument {
    fn validation_errors(&self) -> &ValidationErrors {
        self.processor.errors()
    }
}

impl fmt::Debug for SchemaControlledDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaControlledDocument")
            .field("path", &self.path)
            .field("schema_name", &self.schema_name())
            .field("schema_version", &self.schema_version())
            .field("errors", &self.processor.errors().len())
            .finish()
    }
}

// ─── Typed Documents ─────────────────────────────────────────────────

/// A typed document kind with a fixed schema declaration.
pub trait SchemaControlled: fmt::Debug + Send + Sync + Sized + 'static {
    /// Fails when the declared range is malformed.
    fn schema_support() -> Result<SchemaSupport, SchemaError>;

    /// Attributes beyond the mandatory schema attributes.
    fn elements(_elements: &mut Elements) {}

    fn from_document(document: SchemaControlledDocument) -> Result<Self, SchemaError>;

    fn document(&self) -> &SchemaControlledDocument;

    fn open(loader: &DocumentLoader, path: &Path, strict: bool) -> Result<Self, SchemaError> {
        let document = SchemaControlledDocument::open(
            loader,
            path,
            &Self::schema_support()?,
            Self::elements,
            strict,
        )?;
        Self::from_document(document)
    }

    fn from_content(
        content: Value,
        context: ValidationContext,
        strict: bool,
    ) -> Result<Self, SchemaError> {
        let document = SchemaControlledDocument::from_content(
            content,
            context,
            &Self::schema_support()?,
            Self::elements,
            strict,
        )?;
        Self::from_document(document)
    }
}

/// The dispatch-only document: reads the schema declaration of any file.
#[derive(Debug)]
pub struct GenericDocument {
    document: SchemaControlledDocument,
}

impl SchemaControlled for GenericDocument {
    fn schema_support() -> Result<SchemaSupport, SchemaError> {
        Ok(SchemaSupport::wildcard())
    }

    fn from_document(document: SchemaControlledDocument) -> Result<Self, SchemaError> {
        Ok(Self { document })
    }

    fn document(&self) -> &SchemaControlledDocument {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgate_core::ValidationError;
    use serde_json::json;

    fn support() -> SchemaSupport {
        SchemaSupport::new("Project", "1.0", "2.0")
            .unwrap()
            .legacy_name("ProjectConfig")
    }

    fn ctx() -> ValidationContext {
        ValidationContext::new("project.yaml").with_locality("Project")
    }

    fn no_elements(_: &mut Elements) {}

    fn open(content: Value, strict: bool) -> Result<SchemaControlledDocument, SchemaError> {
        SchemaControlledDocument::from_content(content, ctx(), &support(), no_elements, strict)
    }

    #[test]
    fn test_supported_declaration_is_clean() {
        let doc = open(json!({"schema": {"name": "Project", "version": 1.5}}), true).unwrap();
        assert!(doc.is_valid());
        assert_eq!(doc.schema_name(), Some("Project"));
        assert_eq!(doc.schema_version().map(ToString::to_string).as_deref(), Some("1.5"));
    }

    #[test]
    fn test_legacy_name_is_rewritten() {
        let content = json!({"schema": {"name": "ProjectConfig", "version": "1.0"}});
        let doc = open(content, true).unwrap();
        assert_eq!(doc.schema_name(), Some("Project"));
        assert_eq!(doc.processor().raw()["schema"]["name"], json!("ProjectConfig"));
    }

    #[test]
    fn test_out_of_range_recorded_when_lenient() {
        let doc = open(json!({"schema": {"name": "Project", "version": 2.1}}), false).unwrap();
        assert_eq!(doc.errors().terrors(), 1);
        let report = doc.errors().render().remove(0);
        assert_eq!(report.group, "The file specifies a schema which is not supported.");
        assert_eq!(report.headline, "Got Project v2.1 in [Project] project.yaml");
        assert_eq!(report.detail, "Supports 1.0<=Project<=2.0");
    }

    #[test]
    fn test_out_of_range_fails_when_strict() {
        let err = open(json!({"schema": {"name": "Other", "version": 1.0}}), true).unwrap_err();
        assert!(matches!(
            err.validation(),
            Some(ValidationError::SchemaNotSupported(_))
        ));
    }

    #[test]
    fn test_missing_declaration() {
        let doc = open(json!({"title": "x"}), false).unwrap();
        let groups: Vec<String> = doc.errors().render().into_iter().map(|r| r.group).collect();
        assert_eq!(
            groups,
            vec![
                "Configuration Key Missing",
                "Configuration Key Missing",
                "The file specifies a schema which is not supported.",
            ]
        );
        assert!(doc.errors().render()[2].headline.starts_with("Got (undeclared) v(undeclared)"));
    }

    #[test]
    fn test_wildcard_skips_gate() {
        let doc = GenericDocument::from_content(
            json!({"schema": {"name": "Anything", "version": 99}}),
            ValidationContext::new("any.yaml"),
            true,
        )
        .unwrap();
        assert!(doc.document().is_valid());
        assert_eq!(doc.document().schema_name(), Some("Anything"));
    }

    #[test]
    fn test_schema_policy_attribute_is_not_a_value() {
        let doc = open(json!({"schema": {"name": "Project", "version": 1}}), false).unwrap();
        assert!(matches!(
            doc.get(SCHEMA_POLICY),
            Err(SchemaError::PolicyNotResolvable { .. })
        ));
    }

    #[test]
    fn test_inverted_support_is_invalid_declaration() {
        let err = SchemaSupport::new("Project", "2.0", "1.0").unwrap_err();
        match err {
            SchemaError::InvalidDeclaration { name, reason } => {
                assert_eq!(name, "Project");
                assert_eq!(reason, "version_min 2.0 is greater than version_max 1.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_support_bound_is_invalid_declaration() {
        let err = SchemaSupport::new("Project", "1.x", "2.0").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidDeclaration { ref reason, .. } if reason.starts_with("version_min:")
        ));
    }

    #[test]
    fn test_support_keeps_parsed_bounds() {
        let support = support();
        assert_eq!(support.version_min().as_str(), "1.0");
        assert_eq!(*support.version_max(), SchemaVersion::from(2));
        let gate = support.policy(&ctx()).unwrap();
        assert!(gate.validate("Project", &SchemaVersion::parse("1.5").unwrap()));
    }

    #[test]
    fn test_wildcard_support_skips_range() {
        let wildcard = SchemaSupport::wildcard();
        assert!(wildcard.is_wildcard());
        assert_eq!(wildcard.version_min(), wildcard.version_max());
    }
}
