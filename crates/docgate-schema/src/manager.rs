//! # Schema Manager — Registry & Dispatch
//!
//! The manager maps schema names to document kinds and turns a path into
//! the typed document its content declares.
//!
//! ## Registration
//!
//! The host passes an explicit list of [`SchemaModule`]s at construction.
//! Each module whose name falls under the configured prefix gets its
//! `load(manager)` hook called, and registers zero or more kinds with
//! [`SchemaManager::load_schema`]. Registering a name again replaces the
//! earlier kind; both registrations stay in [`SchemaManager::doc_render`].
//!
//! ## Dispatch
//!
//! [`SchemaManager::load`] reads the file once through [`GenericDocument`]
//! to learn its declared name, looks the name up, and then opens the path
//! again with the registered kind. The second read is a fresh parse, so a
//! load always reflects what is on disk.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use docgate_core::{
    ConfigOptionPolicy, SchemaNotSupportedError, SchemaVersion, ValidationContext,
    ValidationErrors,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{GenericDocument, SchemaControlled, SchemaControlledDocument, SchemaSupport};
use crate::error::SchemaError;
use crate::processor::Elements;
use crate::source::DocumentLoader;

// ─── Configuration ───────────────────────────────────────────────────

/// Manager settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Only modules whose name starts with this prefix are loaded.
    pub prefix: String,
    /// Fail dispatch on a schema version mismatch instead of recording it.
    pub strict_schema: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            prefix: "docgate".to_string(),
            strict_schema: false,
        }
    }
}

// ─── Modules & Documents ─────────────────────────────────────────────

/// A unit of schema registrations supplied by the host application.
pub trait SchemaModule: Send + Sync {
    /// Namespaced module name, e.g. `docgate.project`.
    fn module_name(&self) -> &str;

    fn load(&self, manager: &mut SchemaManager) -> Result<(), SchemaError>;
}

/// A loaded document of any registered kind.
pub trait SchemaDocument: fmt::Debug + Send + Sync + 'static {
    fn controlled(&self) -> &SchemaControlledDocument;

    fn as_any(&self) -> &dyn Any;
}

impl<T: SchemaControlled> SchemaDocument for T {
    fn controlled(&self) -> &SchemaControlledDocument {
        SchemaControlled::document(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl SchemaDocument for SchemaControlledDocument {
    fn controlled(&self) -> &SchemaControlledDocument {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn SchemaDocument {
    /// Recover the concrete document kind.
    pub fn downcast_ref<T: SchemaDocument>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.controlled().schema_name()
    }

    pub fn schema_version(&self) -> Option<&SchemaVersion> {
        self.controlled().schema_version()
    }

    pub fn path(&self) -> Option<&Path> {
        self.controlled().path()
    }

    pub fn errors(&self) -> &ValidationErrors {
        self.controlled().errors()
    }
}

type OpenFn =
    dyn Fn(&DocumentLoader, &Path, bool) -> Result<Box<dyn SchemaDocument>, SchemaError> + Send + Sync;

struct Registration {
    support: SchemaSupport,
    open: Arc<OpenFn>,
}

fn no_elements(_: &mut Elements) {}

// ─── Manager ─────────────────────────────────────────────────────────

/// Registry of document kinds by schema name.
pub struct SchemaManager {
    config: ManagerConfig,
    loader: DocumentLoader,
    context: ValidationContext,
    schemas: BTreeMap<String, Registration>,
    docs: Vec<(String, String)>,
}

impl SchemaManager {
    /// Build a manager reading from the filesystem. Fails on the first
    /// module that cannot register its kinds.
    pub fn new(config: ManagerConfig, modules: &[&dyn SchemaModule]) -> Result<Self, SchemaError> {
        Self::with_loader(config, DocumentLoader::default(), modules)
    }

    pub fn with_loader(
        config: ManagerConfig,
        loader: DocumentLoader,
        modules: &[&dyn SchemaModule],
    ) -> Result<Self, SchemaError> {
        let mut manager = Self {
            config,
            loader,
            context: ValidationContext::new(module_path!()),
            schemas: BTreeMap::new(),
            docs: Vec::new(),
        };
        manager.load_schemas(modules)?;
        Ok(manager)
    }

    fn load_schemas(&mut self, modules: &[&dyn SchemaModule]) -> Result<(), SchemaError> {
        debug!(prefix = %self.config.prefix, "loading schema modules");
        for module in modules {
            let name = module.module_name();
            if name == module_path!() {
                continue;
            }
            if !name.starts_with(self.config.prefix.as_str()) {
                debug!(module = name, "skipping module outside prefix");
                continue;
            }
            debug!(module = name, "loading schema module");
            module.load(self)?;
        }
        debug!(prefix = %self.config.prefix, schemas = self.schemas.len(), "done loading schema modules");
        Ok(())
    }

    /// Register a typed document kind under `name`.
    pub fn load_schema<T: SchemaControlled>(
        &mut self,
        name: impl Into<String>,
        doc: impl Into<String>,
    ) -> Result<(), SchemaError> {
        let support = T::schema_support()?;
        let open: Arc<OpenFn> = Arc::new(|loader: &DocumentLoader, path: &Path, strict: bool| {
            T::open(loader, path, strict).map(|d| Box::new(d) as Box<dyn SchemaDocument>)
        });
        self.install(name.into(), support, open, doc.into());
        Ok(())
    }

    /// Register a gate-only kind built at runtime. The kind declares no
    /// attributes beyond the schema declaration itself.
    pub fn load_dynamic_schema(&mut self, support: SchemaSupport, doc: impl Into<String>) {
        let name = support.name.clone();
        let captured = support.clone();
        let open: Arc<OpenFn> = Arc::new(move |loader: &DocumentLoader, path: &Path, strict: bool| {
            SchemaControlledDocument::open(loader, path, &captured, no_elements, strict)
                .map(|d| Box::new(d) as Box<dyn SchemaDocument>)
        });
        self.install(name, support, open, doc.into());
    }

    fn install(&mut self, name: String, support: SchemaSupport, open: Arc<OpenFn>, doc: String) {
        debug!(schema = %name, "installing schema definition");
        self.schemas.insert(name.clone(), Registration { support, open });
        self.docs.push((name, doc));
    }

    /// Load a document with the configured strictness.
    pub fn load(&self, path: &Path) -> Result<Box<dyn SchemaDocument>, SchemaError> {
        self.load_with(path, self.config.strict_schema)
    }

    /// Load a document and dispatch it to its declared kind.
    pub fn load_with(&self, path: &Path, strict: bool) -> Result<Box<dyn SchemaDocument>, SchemaError> {
        let generic = GenericDocument::open(&self.loader, path, false)?;
        let declared = SchemaControlled::document(&generic).schema_name().map(str::to_string);
        debug!(
            path = %path.display(),
            schema = declared.as_deref().unwrap_or("(undeclared)"),
            "dispatching document"
        );

        match declared.as_deref().and_then(|name| self.lookup(name)) {
            Some(registration) => (registration.open)(&self.loader, path, strict),
            None => {
                let policy = ConfigOptionPolicy::new(self.context.clone(), "schema.name")
                    .options(self.schema_names());
                Err(SchemaNotSupportedError::new(
                    Arc::new(policy),
                    declared.unwrap_or_else(|| "(undeclared)".to_string()),
                )
                .into())
            }
        }
    }

    /// Registered name first, then any kind accepting `name` as its legacy name.
    fn lookup(&self, name: &str) -> Option<&Registration> {
        self.schemas.get(name).or_else(|| {
            self.schemas
                .values()
                .find(|r| r.support.legacy_name.as_deref() == Some(name))
        })
    }

    /// `(name, description)` for every registration, in registration order.
    pub fn doc_render(&self) -> &[(String, String)] {
        &self.docs
    }

    /// Registered names, sorted.
    pub fn schema_names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    pub fn support(&self, name: &str) -> Option<&SchemaSupport> {
        self.schemas.get(name).map(|r| &r.support)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }
}

impl fmt::Debug for SchemaManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaManager")
            .field("config", &self.config)
            .field("schemas", &self.schema_names())
            .finish()
    }
}
