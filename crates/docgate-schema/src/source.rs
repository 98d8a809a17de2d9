//! # Document Sources & Stub Generation
//!
//! The two outer boundaries of document processing:
//!
//! - [`DocumentSource`] turns a path into a parsed value tree. It must
//!   tell "does not exist" apart from "exists but unparsable", because stub
//!   generation keys off the former.
//! - [`StubRenderer`] renders a template into a fresh document when the
//!   target path is absent and the schema names a template.
//!
//! [`DocumentLoader`] bundles one of each. The defaults read `.json` files
//! as JSON and everything else as YAML, and substitute
//! `{{ stage.schema_name }}` / `{{ stage.schema_version }}` placeholders.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::document::SchemaSupport;
use crate::error::SchemaError;

// ─── Sources ─────────────────────────────────────────────────────────

/// Failure of a document source.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Nothing exists at the path.
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but its content is not a readable document.
    #[error("document '{}' is unparsable: {reason}", .path.display())]
    Unparsable { path: PathBuf, reason: String },

    /// The path exists but could not be read.
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Produces parsed document trees from named paths.
pub trait DocumentSource: fmt::Debug + Send + Sync {
    fn parse(&self, path: &Path) -> Result<Value, DocumentError>;
}

/// Reads documents from the filesystem. `.json` files are parsed as JSON,
/// everything else as YAML.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl DocumentSource for FileSource {
    fn parse(&self, path: &Path) -> Result<Value, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DocumentError::NotFound(path.to_path_buf()),
            _ => DocumentError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let unparsable = |reason: String| DocumentError::Unparsable {
            path: path.to_path_buf(),
            reason,
        };

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| unparsable(format!("invalid JSON: {e}")))
            }
            _ if content.trim().is_empty() => Ok(Value::Null),
            _ => {
                let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                    .map_err(|e| unparsable(format!("invalid YAML: {e}")))?;
                yaml_to_json_value(&yaml)
                    .map_err(|e| unparsable(format!("YAML-to-JSON conversion failed: {e}")))
            }
        }
    }
}

/// Convert a YAML value tree into the equivalent JSON value tree.
///
/// Tags are dropped in favour of their inner value. Scalar map keys are
/// stringified; complex keys are rejected.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent {f} as a document number"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported map key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

// ─── Stubs ───────────────────────────────────────────────────────────

/// Values available to a stub template as `stage.*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StubStage {
    pub schema_name: String,
    pub schema_version: String,
}

impl StubStage {
    /// The stage for a schema: its supported name and maximum version.
    pub fn for_support(support: &SchemaSupport) -> Self {
        Self {
            schema_name: support.name.clone(),
            schema_version: support.version_max().to_string(),
        }
    }

    fn lookup(&self, expression: &str) -> Option<&str> {
        match expression {
            "stage.schema_name" => Some(&self.schema_name),
            "stage.schema_version" => Some(&self.schema_version),
            _ => None,
        }
    }
}

/// Renders a stub template for a stage.
pub trait StubRenderer: fmt::Debug + Send + Sync {
    fn render(&self, template: &str, stage: &StubStage) -> Result<String, String>;
}

/// Substitutes `{{ stage.schema_name }}` and `{{ stage.schema_version }}`.
///
/// Whitespace inside the braces is ignored. Any other `{{ ... }}`
/// expression is left in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl StubRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, stage: &StubStage) -> Result<String, String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find("{{") {
            let Some(close) = rest[open + 2..].find("}}") else {
                break;
            };
            let close = open + 2 + close;
            out.push_str(&rest[..open]);
            match stage.lookup(rest[open + 2..close].trim()) {
                Some(value) => out.push_str(value),
                None => out.push_str(&rest[open..close + 2]),
            }
            rest = &rest[close + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

// ─── Loader ──────────────────────────────────────────────────────────

/// A document source paired with a stub renderer.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    source: Arc<dyn DocumentSource>,
    renderer: Arc<dyn StubRenderer>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(FileSource, PlaceholderRenderer)
    }
}

impl DocumentLoader {
    pub fn new(source: impl DocumentSource + 'static, renderer: impl StubRenderer + 'static) -> Self {
        Self {
            source: Arc::new(source),
            renderer: Arc::new(renderer),
        }
    }

    pub fn source(&self) -> &dyn DocumentSource {
        self.source.as_ref()
    }

    /// Read the document at `path` for a schema.
    ///
    /// An absent document is first stub-generated if the schema names a
    /// template. If it is still absent, schemas that require it fail with
    /// [`SchemaError::DocumentNotFound`]; others read it as empty content,
    /// which surfaces through the document's accumulated errors.
    pub fn load(&self, path: &Path, support: &SchemaSupport) -> Result<Value, SchemaError> {
        match self.source.parse(path) {
            Err(DocumentError::NotFound(_)) => {}
            other => return other.map_err(SchemaError::from),
        }

        if let Some(template) = &support.template {
            self.generate_stub(template, path, &StubStage::for_support(support))?;
            match self.source.parse(path) {
                Err(DocumentError::NotFound(_)) => {}
                other => return other.map_err(SchemaError::from),
            }
        }

        if support.require_exists {
            return Err(SchemaError::DocumentNotFound {
                path: path.display().to_string(),
            });
        }
        Ok(Value::Null)
    }

    /// Render `template` for `stage` and write the result to `target`.
    pub fn generate_stub(
        &self,
        template: &Path,
        target: &Path,
        stage: &StubStage,
    ) -> Result<(), SchemaError> {
        let stub_error = |reason: String| SchemaError::StubGeneration {
            path: target.display().to_string(),
            reason,
        };
        debug!(
            template = %template.display(),
            target = %target.display(),
            schema = %stage.schema_name,
            "generating stub document"
        );
        let text = std::fs::read_to_string(template)
            .map_err(|e| stub_error(format!("cannot read template '{}': {e}", template.display())))?;
        let rendered = self.renderer.render(&text, stage).map_err(stub_error)?;
        std::fs::write(target, rendered).map_err(|e| stub_error(format!("cannot write stub: {e}")))
    }
}
