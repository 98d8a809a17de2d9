//! # Schema Processors — Declared Attributes over a Raw Document
//!
//! A processor owns one raw document and a flat, ordered declaration of
//! attribute name → [`Policy`]. Declarations compose explicitly: a type's
//! `elements` hook calls its base layer's hook first and then inserts its
//! own entries into the same [`Elements`]; a later insert under an existing
//! name replaces the earlier policy.
//!
//! ## Resolution
//!
//! [`SchemaProcessor::process`] resolves every value policy eagerly.
//! Failures are recorded in the processor's [`ValidationErrors`] and the
//! attribute slot stays unbound; errors carried by nested validatable
//! values are merged into the parent set.
//!
//! [`SchemaProcessor::get`] is the single accessor. A bound slot is
//! returned as-is; an unbound slot resolves against the raw document on
//! first access and is memoized when that succeeds.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use docgate_core::{
    ConfigOptionPolicy, KeyPath, ParseError, Parser, Resolved, ResolvedObject, SchemaPolicy,
    Validatable, ValidationContext, ValidationError, ValidationErrors,
};
use serde_json::Value;
use tracing::warn;

use crate::error::SchemaError;

/// A declared attribute's policy.
#[derive(Debug, Clone)]
pub enum Policy {
    /// Resolves a value out of the raw document.
    Option(Arc<ConfigOptionPolicy>),
    /// A schema gate. Consulted by the owning document, never resolved.
    Schema(Arc<SchemaPolicy>),
}

// ─── Declarations ────────────────────────────────────────────────────

/// Ordered attribute declarations with last-writer-wins inserts.
#[derive(Debug, Clone)]
pub struct Elements {
    context: ValidationContext,
    entries: Vec<(String, Policy)>,
}

impl Elements {
    pub fn new(context: ValidationContext) -> Self {
        Self {
            context,
            entries: Vec::new(),
        }
    }

    /// The context every policy built through [`Elements::option`] reports under.
    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    /// Start a value policy in this declaration's context.
    pub fn option(&self, path: impl Into<KeyPath>) -> ConfigOptionPolicy {
        ConfigOptionPolicy::new(self.context.clone(), path)
    }

    /// Declare a value attribute, replacing any earlier declaration of `name`.
    pub fn insert(&mut self, name: impl Into<String>, policy: ConfigOptionPolicy) -> &mut Self {
        self.put(name.into(), Policy::Option(Arc::new(policy)))
    }

    /// Declare a schema gate, replacing any earlier declaration of `name`.
    pub fn insert_schema(&mut self, name: impl Into<String>, policy: SchemaPolicy) -> &mut Self {
        self.put(name.into(), Policy::Schema(Arc::new(policy)))
    }

    fn put(&mut self, name: String, policy: Policy) -> &mut Self {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = policy,
            None => self.entries.push((name, policy)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Policy> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Policy)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── Processor ───────────────────────────────────────────────────────

/// A raw document bound to its attribute declarations.
pub struct SchemaProcessor {
    type_name: String,
    raw: Value,
    policies: Elements,
    slots: BTreeMap<String, OnceLock<Resolved>>,
    errors: ValidationErrors,
}

impl SchemaProcessor {
    /// Bind `raw` to `policies`. Nothing is resolved until
    /// [`process`](Self::process) or [`get`](Self::get).
    pub fn new(type_name: impl Into<String>, raw: Value, policies: Elements) -> Self {
        let slots = policies
            .iter()
            .filter(|(_, p)| matches!(p, Policy::Option(_)))
            .map(|(n, _)| (n.to_string(), OnceLock::new()))
            .collect();
        Self {
            type_name: type_name.into(),
            raw,
            policies,
            slots,
            errors: ValidationErrors::new(),
        }
    }

    /// Eagerly resolve every value attribute, accumulating failures.
    pub fn process(&mut self) {
        for (name, policy) in self.policies.iter() {
            let Policy::Option(policy) = policy else {
                continue;
            };
            match policy.get(&self.raw) {
                Ok(value) => {
                    if let Some(nested) = value.validation_errors() {
                        self.errors.merge(nested);
                    }
                    self.slots.insert(name.to_string(), OnceLock::from(value));
                }
                Err(e) => self.errors.add(e),
            }
        }
    }

    /// Resolve a declared attribute, memoizing on success.
    pub fn get(&self, name: &str) -> Result<&Resolved, SchemaError> {
        let policy = match self.policies.get(name) {
            Some(Policy::Option(policy)) => Some(policy),
            Some(Policy::Schema(_)) => {
                return Err(SchemaError::PolicyNotResolvable {
                    type_name: self.type_name.clone(),
                    attribute: name.to_string(),
                })
            }
            None => None,
        };
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| SchemaError::UnknownAttribute {
                type_name: self.type_name.clone(),
                attribute: name.to_string(),
            })?;
        if let Some(value) = slot.get() {
            return Ok(value);
        }
        match policy {
            Some(policy) => {
                let value = policy.get(&self.raw)?;
                Ok(slot.get_or_init(|| value))
            }
            None => Err(SchemaError::UnknownAttribute {
                type_name: self.type_name.clone(),
                attribute: name.to_string(),
            }),
        }
    }

    /// Resolve an attribute and recover its nested object type.
    pub fn get_object<T: ResolvedObject>(&self, name: &str) -> Result<Option<&T>, SchemaError> {
        Ok(self.get(name)?.downcast_ref::<T>())
    }

    /// Resolve an attribute as text. Absent optional values are `None`.
    pub fn get_str(&self, name: &str) -> Result<Option<&str>, SchemaError> {
        Ok(self.get(name)?.as_str())
    }

    /// Overwrite an attribute's value in memory. The raw document is untouched.
    pub fn bind(&mut self, name: impl Into<String>, value: Resolved) {
        self.slots.insert(name.into(), OnceLock::from(value));
    }

    /// Whether `name` currently holds a resolved value.
    pub fn is_bound(&self, name: &str) -> bool {
        self.slots.get(name).is_some_and(|s| s.get().is_some())
    }

    /// Record a non-fatal error against this processor.
    pub fn record(&mut self, error: impl Into<ValidationError>) {
        self.errors.add(error);
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn context(&self) -> &ValidationContext {
        self.policies.context()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn policies(&self) -> &Elements {
        &self.policies
    }

    pub fn policy(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }
}

impl Validatable for SchemaProcessor {
    fn validation_errors(&self) -> &ValidationErrors {
        &self.errors
    }
}

impl fmt::Debug for SchemaProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaProcessor")
            .field("type_name", &self.type_name)
            .field("context", &self.context().render())
            .field("attributes", &self.policies.names().collect::<Vec<_>>())
            .field("errors", &self.errors.len())
            .finish()
    }
}

// ─── Naked Schema Objects ────────────────────────────────────────────

/// A typed object built from an already-parsed document fragment.
///
/// Implementors declare their attributes in [`elements`](Self::elements)
/// and wrap the processed [`SchemaProcessor`] in
/// [`from_processor`](Self::from_processor). Construction never fails on
/// field-level problems; those land in the processor's error set.
pub trait NakedSchemaObject: Validatable + fmt::Debug + Send + Sync + Sized + 'static {
    /// Type label used in contexts and logs.
    const NAME: &'static str;

    fn elements(elements: &mut Elements);

    fn from_processor(processor: SchemaProcessor) -> Result<Self, SchemaError>;

    fn build(content: &Value, context: &ValidationContext) -> Result<Self, SchemaError> {
        let mut elements = Elements::new(context.clone());
        Self::elements(&mut elements);
        let mut processor = SchemaProcessor::new(Self::NAME, content.clone(), elements);
        processor.process();
        warn_on_errors(Self::NAME, &processor);
        Self::from_processor(processor)
    }

    /// A parser building this object from a nested fragment.
    fn parser() -> Parser {
        Parser::nested(Self::NAME, |value, context| {
            Self::build(value, context).map_err(|e| ParseError::new(e.to_string()))
        })
    }
}

pub(crate) fn warn_on_errors(type_name: &str, processor: &SchemaProcessor) {
    let terrors = processor.errors().terrors();
    if terrors > 0 {
        warn!(
            object = %processor.context(),
            type_name,
            terrors,
            "schema object has validation errors"
        );
    }
}
