//! # Schemas Subcommand
//!
//! Lists the document kinds a registry file installs.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use docgate_schema::SchemaManager;

use crate::registry::Registry;

/// Arguments for `docgate schemas`.
#[derive(Args, Debug)]
pub struct SchemasArgs {
    /// Schema registry file.
    #[arg(long)]
    pub registry: PathBuf,
}

/// Execute `docgate schemas`.
pub fn run_schemas(args: &SchemasArgs) -> Result<u8> {
    let manager = Registry::load(&args.registry)?.manager()?;
    print!("{}", render_listing(&manager));
    Ok(0)
}

/// One line per registration: name, accepted versions and description.
pub fn render_listing(manager: &SchemaManager) -> String {
    if manager.is_empty() {
        return "No schemas registered.\n".to_string();
    }
    let width = manager
        .doc_render()
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (name, doc) in manager.doc_render() {
        let range = manager
            .support(name)
            .map(|s| format!("{}..={}", s.version_min(), s.version_max()))
            .unwrap_or_default();
        out.push_str(&format!("{name:<width$}  {range:<10}  {doc}\n"));
    }
    out
}
