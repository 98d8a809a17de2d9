//! # Validation Context — Error Provenance Chains
//!
//! A `ValidationContext` names where a value came from: the document
//! source (usually a file path), the schema locality that was processing
//! it, and the chain of nested segments (parser names, collection keys,
//! item positions) walked to reach it.
//!
//! Contexts are immutable. [`ValidationContext::child`] returns a new
//! context extending the chain; the parent is never modified.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable chain of path segments plus an optional locality label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationContext {
    locality: Option<String>,
    path: Vec<String>,
}

impl ValidationContext {
    /// Create a root context for a document source.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            locality: None,
            path: vec![root.into()],
        }
    }

    /// Attach a locality label (typically the schema name processing the source).
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    /// Derive a child context one segment deeper. The locality is inherited.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(segment.into());
        Self {
            locality: self.locality.clone(),
            path,
        }
    }

    pub fn locality(&self) -> Option<&str> {
        self.locality.as_deref()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Human-readable provenance, e.g. `[Project] project.yaml > pcbs > 2`.
    pub fn render(&self) -> String {
        let chain = self.path.join(" > ");
        match &self.locality {
            Some(locality) => format!("[{locality}] {chain}"),
            None => chain,
        }
    }
}

impl fmt::Display for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_render_without_locality() {
        let ctx = ValidationContext::new("project.yaml");
        assert_eq!(ctx.render(), "project.yaml");
        assert!(ctx.locality().is_none());
    }

    #[test]
    fn test_child_extends_chain_and_keeps_parent() {
        let root = ValidationContext::new("project.yaml").with_locality("Project");
        let child = root.child("pcbs").child("2");
        assert_eq!(root.path(), &["project.yaml".to_string()]);
        assert_eq!(child.path().len(), 3);
        assert_eq!(child.locality(), Some("Project"));
        assert_eq!(child.render(), "[Project] project.yaml > pcbs > 2");
    }

    #[test]
    fn test_display_matches_render() {
        let ctx = ValidationContext::new("a").child("b");
        assert_eq!(ctx.to_string(), ctx.render());
    }
}
