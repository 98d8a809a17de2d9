//! # Schema Registry File
//!
//! The CLI has no compiled-in document kinds. Instead it reads a YAML
//! registry listing the schema names it should accept and the version
//! range of each, and registers one gate-only kind per entry.
//!
//! ```yaml
//! prefix: docgate
//! strict_schema: false
//! schemas:
//!   - name: Project
//!     version_min: 1.0
//!     version_max: 1.2
//!     legacy_name: ProjectConfig
//!     description: Project definition files
//!     template: templates/project.yaml.tpl
//! ```
//!
//! Relative template paths resolve against the registry file's directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use docgate_core::SchemaVersion;
use docgate_schema::{ManagerConfig, SchemaError, SchemaManager, SchemaModule, SchemaSupport};

/// Top-level registry document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryFile {
    /// Module prefix handed to the manager. Defaults to the manager default.
    pub prefix: Option<String>,
    /// Treat schema version mismatches as load failures.
    pub strict_schema: Option<bool>,
    pub schemas: Vec<RegistryEntry>,
}

/// One accepted document kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub version_min: SchemaVersion,
    pub version_max: SchemaVersion,
    #[serde(default)]
    pub legacy_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Stub template used when the document does not exist yet.
    #[serde(default)]
    pub template: Option<PathBuf>,
}

impl RegistryEntry {
    fn support(&self, base: &Path) -> Result<SchemaSupport, SchemaError> {
        let mut support = SchemaSupport::with_range(
            self.name.clone(),
            self.version_min.clone(),
            self.version_max.clone(),
        )?;
        if let Some(legacy) = &self.legacy_name {
            support = support.legacy_name(legacy.clone());
        }
        if let Some(template) = &self.template {
            support = support.template(base.join(template));
        }
        Ok(support)
    }
}

/// A registry file together with the directory it was read from.
#[derive(Debug, Clone)]
pub struct Registry {
    file: RegistryFile,
    base: PathBuf,
}

impl Registry {
    /// Read and validate a registry file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read registry {}", path.display()))?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let registry = Self::parse(&content, base)
            .with_context(|| format!("invalid registry {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            schemas = registry.file.schemas.len(),
            "loaded schema registry"
        );
        Ok(registry)
    }

    /// Parse registry content; `base` anchors relative template paths.
    pub fn parse(content: &str, base: impl Into<PathBuf>) -> Result<Self> {
        let file: RegistryFile = if content.trim().is_empty() {
            RegistryFile::default()
        } else {
            serde_yaml::from_str(content).context("failed to parse registry YAML")?
        };
        for entry in &file.schemas {
            if entry.version_min > entry.version_max {
                bail!(
                    "schema {}: version_min {} is greater than version_max {}",
                    entry.name,
                    entry.version_min,
                    entry.version_max
                );
            }
        }
        Ok(Self {
            file,
            base: base.into(),
        })
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.file.schemas
    }

    /// Manager settings, with registry values overriding the defaults.
    pub fn manager_config(&self) -> ManagerConfig {
        let mut config = ManagerConfig::default();
        if let Some(prefix) = &self.file.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(strict) = self.file.strict_schema {
            config.strict_schema = strict;
        }
        config
    }

    /// Build a manager with every registry entry installed.
    pub fn manager(&self) -> Result<SchemaManager> {
        let config = self.manager_config();
        let module = RegistryModule {
            name: format!("{}.registry", config.prefix),
            registry: self,
        };
        SchemaManager::new(config, &[&module]).context("failed to install registry schemas")
    }
}

struct RegistryModule<'a> {
    name: String,
    registry: &'a Registry,
}

impl SchemaModule for RegistryModule<'_> {
    fn module_name(&self) -> &str {
        &self.name
    }

    fn load(&self, manager: &mut SchemaManager) -> Result<(), SchemaError> {
        for entry in self.registry.entries() {
            let doc = entry
                .description
                .clone()
                .unwrap_or_else(|| format!("{} documents", entry.name));
            manager.load_dynamic_schema(entry.support(&self.registry.base)?, doc);
        }
        Ok(())
    }
}
