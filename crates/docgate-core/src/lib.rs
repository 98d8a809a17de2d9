//! # docgate-core — Validation Primitives
//!
//! The leaf crate of the docgate workspace. It knows nothing about files,
//! schemas registries or stubs; it only defines how a single datum is
//! pulled out of a nested document and how failures are described.
//!
//! ## Contents
//!
//! - [`ValidationContext`]: immutable provenance chains for error reports.
//! - [`SchemaVersion`]: exact decimal versions (`1.10 == 1.1`, `1.9 > 1.10`).
//! - [`Parser`]: named value parsers, nested object builders and candidate lists.
//! - [`ConfigOptionPolicy`]: declarative resolution of one configuration datum.
//! - [`SchemaPolicy`]: the accepted `(name, version range)` of a schema.
//! - [`ValidationError`] / [`ValidationErrors`]: the error taxonomy and the
//!   accumulating, non-fatal error set every processed object carries.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `docgate-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod context;
pub mod error;
pub mod parser;
pub mod policy;
pub mod value;
pub mod version;

pub use context::ValidationContext;
pub use error::{
    display_value, ConfigKeyError, ConfigValueInvalidError, DocumentInvalidError, ErrorReport,
    ParseError, SchemaNotSupportedError, ValidationError, ValidationErrors, VersionError,
};
pub use parser::Parser;
pub use policy::{ConfigOptionPolicy, DefaultValue, KeyPath, SchemaPolicy, ValidationPolicy};
pub use value::{Resolved, ResolvedObject, Validatable};
pub use version::SchemaVersion;
