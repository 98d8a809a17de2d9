//! # Schema Errors
//!
//! Library-level failures of document processing. Field-level validation
//! problems never appear here while a document is being built; they are
//! accumulated in the object's [`ValidationErrors`](docgate_core::ValidationErrors).
//! A [`SchemaError`] means there is no object to accumulate into, or the
//! caller asked for hard failure.

use docgate_core::{SchemaNotSupportedError, ValidationError};
use thiserror::Error;

use crate::source::DocumentError;

/// Error raised by schema processors, documents and the manager.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A validation error that could not be accumulated: a strict-mode
    /// schema mismatch, an unknown schema at dispatch, or a lazily
    /// resolved attribute that failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The attribute is not declared by the processor.
    #[error("{type_name} has no attribute '{attribute}'")]
    UnknownAttribute {
        /// Processor type that was asked.
        type_name: String,
        /// Requested attribute name.
        attribute: String,
    },

    /// The attribute names a policy that does not produce a value.
    #[error("attribute '{attribute}' of {type_name} is a schema gate, not a value")]
    PolicyNotResolvable {
        type_name: String,
        attribute: String,
    },

    /// The document does not exist and the schema requires it to.
    #[error("document not found: {path}")]
    DocumentNotFound {
        path: String,
    },

    /// The document exists but could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        path: String,
        reason: String,
    },

    /// A stub document could not be rendered or written.
    #[error("stub generation failed for '{path}': {reason}")]
    StubGeneration {
        path: String,
        reason: String,
    },

    /// A schema type declares an unusable version range.
    #[error("invalid schema declaration for '{name}': {reason}")]
    InvalidDeclaration {
        name: String,
        reason: String,
    },
}

impl SchemaError {
    /// The underlying validation error, if this is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SchemaNotSupportedError> for SchemaError {
    fn from(e: SchemaNotSupportedError) -> Self {
        Self::Validation(e.into())
    }
}

impl From<DocumentError> for SchemaError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::NotFound(path) => Self::DocumentNotFound {
                path: path.display().to_string(),
            },
            DocumentError::Unparsable { path, reason } => Self::DocumentLoad {
                path: path.display().to_string(),
                reason,
            },
            DocumentError::Io { path, source } => Self::DocumentLoad {
                path: path.display().to_string(),
                reason: format!("cannot read file: {source}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_read_failure_becomes_document_load() {
        let err = SchemaError::from(DocumentError::Io {
            path: PathBuf::from("locked.yaml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        });
        match err {
            SchemaError::DocumentLoad { path, reason } => {
                assert_eq!(path, "locked.yaml");
                assert_eq!(reason, "cannot read file: permission denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_document_keeps_its_path() {
        let err = SchemaError::from(DocumentError::NotFound(PathBuf::from("gone.yaml")));
        assert_eq!(err.to_string(), "document not found: gone.yaml");
        assert!(err.validation().is_none());
    }
}
