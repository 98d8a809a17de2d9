//! # Per-Document Reports
//!
//! Shared output model for `inspect` and `check`: one [`DocumentReport`]
//! per path, printed as text or serialized as JSON.

use std::path::Path;

use serde::Serialize;

use docgate_core::{ErrorReport, ValidationErrors};
use docgate_schema::{SchemaControlledDocument, SchemaError};

/// Outcome of loading one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Loaded with no error-level validation errors (warnings allowed).
    Valid,
    /// Loaded, but carries error-level validation errors.
    Invalid,
    /// Could not be loaded at all.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub path: String,
    pub schema: Option<String>,
    pub version: Option<String>,
    pub status: Status,
    pub errors: usize,
    pub warnings: usize,
    pub reports: Vec<ErrorReport>,
    /// Load failure message, set only for [`Status::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn loaded(path: &Path, document: &SchemaControlledDocument) -> Self {
        let errors = document.errors();
        Self {
            path: path.display().to_string(),
            schema: document.schema_name().map(str::to_string),
            version: document.schema_version().map(ToString::to_string),
            status: status_of(errors),
            errors: errors.terrors(),
            warnings: errors.twarnings(),
            reports: errors.render(),
            error: None,
        }
    }

    pub fn failed(path: &Path, err: &SchemaError) -> Self {
        let reports: Vec<ErrorReport> = err.validation().map(|v| v.render()).into_iter().collect();
        Self {
            path: path.display().to_string(),
            schema: None,
            version: None,
            status: Status::Failed,
            errors: reports.len(),
            warnings: 0,
            reports,
            error: Some(err.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Valid
    }

    /// Human-readable rendering.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let declared = match (&self.schema, &self.version) {
            (Some(name), Some(version)) => format!("{name} v{version}"),
            (Some(name), None) => name.clone(),
            _ => "(undeclared)".to_string(),
        };
        match self.status {
            Status::Valid if self.warnings == 0 => {
                out.push_str(&format!("{}: {declared} OK\n", self.path));
            }
            Status::Valid => {
                out.push_str(&format!(
                    "{}: {declared} OK ({} warnings)\n",
                    self.path, self.warnings
                ));
            }
            Status::Invalid => {
                out.push_str(&format!(
                    "{}: {declared} INVALID ({} errors, {} warnings)\n",
                    self.path, self.errors, self.warnings
                ));
            }
            Status::Failed => {
                let message = self.error.as_deref().unwrap_or("load failed");
                out.push_str(&format!("{}: FAILED: {message}\n", self.path));
            }
        }
        for report in &self.reports {
            let level = if report.is_error { "error" } else { "warning" };
            out.push_str(&format!("  {level}: {}\n", report.group));
            out.push_str(&format!("    {}\n", report.headline));
            if !report.detail.is_empty() {
                out.push_str(&format!("    {}\n", report.detail));
            }
        }
        out
    }
}

fn status_of(errors: &ValidationErrors) -> Status {
    if errors.terrors() > 0 {
        Status::Invalid
    } else {
        Status::Valid
    }
}

/// Print reports to stdout, as a pretty JSON array or as text.
pub fn emit(reports: &[DocumentReport], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        for report in reports {
            print!("{}", report.to_text());
        }
    }
    Ok(())
}
