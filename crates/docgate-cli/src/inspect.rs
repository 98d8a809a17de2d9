//! # Inspect Subcommand
//!
//! Reads any document through the dispatch-only generic pass and reports
//! its schema declaration. No registry is needed.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use docgate_schema::{DocumentLoader, GenericDocument, SchemaControlled};

use crate::report::{emit, DocumentReport};

/// Arguments for `docgate inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Document to inspect.
    pub path: PathBuf,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute `docgate inspect`.
pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    let report = inspect(&DocumentLoader::default(), &args.path);
    emit(std::slice::from_ref(&report), args.json)?;
    Ok(if report.is_ok() { 0 } else { 1 })
}

pub fn inspect(loader: &DocumentLoader, path: &std::path::Path) -> DocumentReport {
    tracing::info!(path = %path.display(), "inspecting document");
    match GenericDocument::open(loader, path, false) {
        Ok(generic) => DocumentReport::loaded(path, generic.document()),
        Err(e) => DocumentReport::failed(path, &e),
    }
}
