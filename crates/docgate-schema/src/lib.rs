//! # docgate-schema — Schema-Versioned Document Processing
//!
//! Builds typed objects out of parsed documents on top of the policies in
//! `docgate-core`.
//!
//! ## Layers
//!
//! - [`processor`]: attribute declarations ([`Elements`]), the
//!   [`SchemaProcessor`] that resolves them against a raw document, and
//!   [`NakedSchemaObject`] for typed fragments.
//! - [`document`]: [`SchemaControlledDocument`], which adds the mandatory
//!   `schema: {name, version}` declaration and its version gate, plus the
//!   [`SchemaControlled`] trait for typed document kinds.
//! - [`source`]: the document source and stub generation boundaries.
//! - [`collections`]: lists, sets and selectable sets of sub-objects.
//! - [`manager`]: the registry that dispatches a file to its declared kind.
//!
//! ## Error Model
//!
//! Field-level problems accumulate on the object being built. A
//! [`SchemaError`] is returned only when there is no object to accumulate
//! into (unreadable file, unknown schema at dispatch, bad declaration) or
//! when the caller asked for strict schema checking.
//!
//! ## Crate Policy
//!
//! - Depends only on `docgate-core` internally.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod collections;
pub mod document;
pub mod error;
pub mod manager;
pub mod processor;
pub mod source;

pub use collections::{ItemParser, SchemaObjectList, SchemaObjectSet, SchemaSelectableObjectSet, Shape};
pub use document::{GenericDocument, SchemaControlled, SchemaControlledDocument, SchemaSupport};
pub use error::SchemaError;
pub use manager::{ManagerConfig, SchemaDocument, SchemaManager, SchemaModule};
pub use processor::{Elements, NakedSchemaObject, Policy, SchemaProcessor};
pub use source::{
    DocumentError, DocumentLoader, DocumentSource, FileSource, PlaceholderRenderer, StubRenderer,
    StubStage,
};
