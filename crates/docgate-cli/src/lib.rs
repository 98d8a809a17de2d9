//! # docgate-cli — Command-Line Front End
//!
//! Provides the `docgate` binary for checking schema-versioned YAML and
//! JSON documents outside of a host application.
//!
//! ## Subcommands
//!
//! - `docgate inspect <path>`: read a document's `schema` declaration and
//!   report any problems with it. Needs no registry.
//! - `docgate check <paths>... --registry <file>`: dispatch each document
//!   to the kind registered under its declared name and report the
//!   accumulated validation errors. Exits non-zero if any document fails
//!   to load or carries error-level problems.
//! - `docgate schemas --registry <file>`: list the registered kinds.
//!
//! ## Registry
//!
//! The document kinds accepted by `check` come from a YAML registry file;
//! see [`registry`] for the format.
//!
//! ```bash
//! docgate schemas --registry schemas.yaml
//! docgate check --registry schemas.yaml --strict project.yaml
//! docgate -vv inspect project.yaml
//! ```

pub mod check;
pub mod inspect;
pub mod registry;
pub mod report;
pub mod schemas;
