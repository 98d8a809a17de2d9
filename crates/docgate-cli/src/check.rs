//! # Check Subcommand
//!
//! Dispatches each document through a [`SchemaManager`] built from a
//! registry file and reports the outcome per path.
//!
//! ```bash
//! docgate check --registry schemas.yaml project.yaml boards/*.yaml
//! docgate check --registry schemas.yaml --strict --json project.yaml
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use docgate_schema::{SchemaDocument, SchemaManager};

use crate::registry::Registry;
use crate::report::{emit, DocumentReport};

/// Arguments for `docgate check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Documents to check.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Schema registry file listing the accepted document kinds.
    #[arg(long)]
    pub registry: PathBuf,

    /// Fail a document whose schema version is out of range.
    #[arg(long)]
    pub strict: bool,

    /// Emit reports as a JSON array.
    #[arg(long)]
    pub json: bool,
}

/// Execute `docgate check`.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let registry = Registry::load(&args.registry)?;
    let manager = registry.manager()?;
    let strict = args.strict || manager.config().strict_schema;

    let reports = check_all(&manager, &args.paths, strict);
    emit(&reports, args.json)?;

    let failing = reports.iter().filter(|r| !r.is_ok()).count();
    if failing > 0 {
        tracing::warn!(failing, total = reports.len(), "documents failed validation");
        return Ok(1);
    }
    tracing::info!(total = reports.len(), "all documents valid");
    Ok(0)
}

/// Load every path through `manager`. One report per path, in order.
pub fn check_all(manager: &SchemaManager, paths: &[PathBuf], strict: bool) -> Vec<DocumentReport> {
    paths.iter().map(|p| check_one(manager, p, strict)).collect()
}

fn check_one(manager: &SchemaManager, path: &Path, strict: bool) -> DocumentReport {
    match manager.load_with(path, strict) {
        Ok(document) => DocumentReport::loaded(path, SchemaDocument::controlled(&*document)),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "document failed to load");
            DocumentReport::failed(path, &e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Status;

    const REGISTRY: &str = "\
schemas:
  - name: Project
    version_min: 1.0
    version_max: 1.2
    legacy_name: ProjectConfig
";

    fn setup() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let registry = dir.path().join("schemas.yaml");
        std::fs::write(&registry, REGISTRY).unwrap();
        (dir, registry)
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_check_reports_each_document() {
        let (dir, registry) = setup();
        let good = write(&dir, "good.yaml", "schema:\n  name: ProjectConfig\n  version: 1.1\n");
        let future = write(&dir, "future.yaml", "schema:\n  name: Project\n  version: 2.0\n");
        let unknown = write(&dir, "unknown.yaml", "schema:\n  name: Widget\n  version: 1\n");

        let manager = Registry::load(&registry).unwrap().manager().unwrap();
        let reports = check_all(&manager, &[good, future.clone(), unknown], false);
        let statuses: Vec<_> = reports.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![Status::Valid, Status::Invalid, Status::Failed]);
        assert_eq!(reports[0].schema.as_deref(), Some("Project"));
        assert_eq!(reports[2].reports[0].detail, "Valid options are Project");

        let strict = check_all(&manager, &[future], true);
        assert_eq!(strict[0].status, Status::Failed);
    }

    #[test]
    fn test_run_check_exit_codes() {
        let (dir, registry) = setup();
        let good = write(&dir, "good.yaml", "schema:\n  name: Project\n  version: 1.0\n");
        let bad = write(&dir, "bad.yaml", "schema:\n  name: Project\n  version: 9\n");

        let ok = CheckArgs {
            paths: vec![good.clone()],
            registry: registry.clone(),
            strict: false,
            json: true,
        };
        assert_eq!(run_check(&ok).unwrap(), 0);

        let mixed = CheckArgs {
            paths: vec![good, bad],
            registry,
            strict: false,
            json: false,
        };
        assert_eq!(run_check(&mixed).unwrap(), 1);
    }

    #[test]
    fn test_missing_registry_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = CheckArgs {
            paths: vec![dir.path().join("a.yaml")],
            registry: dir.path().join("absent.yaml"),
            strict: false,
            json: false,
        };
        let err = run_check(&args).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read registry"));
    }
}
