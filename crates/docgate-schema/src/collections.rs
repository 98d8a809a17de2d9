//! # Schema Object Collections
//!
//! Typed containers for repeated sub-objects:
//!
//! - [`SchemaObjectList`] over a raw sequence,
//! - [`SchemaObjectSet`] over a raw mapping, keyed by name,
//! - [`SchemaSelectableObjectSet`], a set whose `default` key names the
//!   sibling returned for an empty lookup.
//!
//! Items go through an [`ItemParser`]: an optional pre-validator, then a
//! decision table of `(Shape, parser)` candidates tried in declared order
//! with a designated default. A falsy item, one failing the validator, or
//! one its parser rejects is dropped and recorded as one
//! `ConfigValueInvalidError` naming its position or key. A bad item never
//! fails the collection.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use docgate_core::{
    ConfigOptionPolicy, ConfigValueInvalidError, ParseError, Parser, Validatable, ValidationContext,
    ValidationErrors,
};
use serde_json::Value;

use crate::processor::NakedSchemaObject;

/// Key of the selectable set entry naming the default sibling.
pub const DEFAULT_KEY: &str = "default";

type ItemFn<T> = Arc<dyn Fn(&Value, &ValidationContext) -> Result<T, ParseError> + Send + Sync>;
type ValidatorFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

// ─── Shapes ──────────────────────────────────────────────────────────

/// A predicate over the shape of a raw item.
#[derive(Clone)]
pub enum Shape {
    Null,
    Bool,
    Number,
    String,
    /// Any of bool, number or string.
    Scalar,
    Sequence,
    Mapping,
    /// A mapping containing every listed key.
    MappingWithKeys(Vec<String>),
    Custom(ValidatorFn),
}

impl Shape {
    pub fn custom(predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    pub fn mapping_with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MappingWithKeys(keys.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Null => value.is_null(),
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Scalar => value.is_boolean() || value.is_number() || value.is_string(),
            Self::Sequence => value.is_array(),
            Self::Mapping => value.is_object(),
            Self::MappingWithKeys(keys) => value
                .as_object()
                .is_some_and(|m| keys.iter().all(|k| m.contains_key(k))),
            Self::Custom(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool => f.write_str("Bool"),
            Self::Number => f.write_str("Number"),
            Self::String => f.write_str("String"),
            Self::Scalar => f.write_str("Scalar"),
            Self::Sequence => f.write_str("Sequence"),
            Self::Mapping => f.write_str("Mapping"),
            Self::MappingWithKeys(keys) => f.debug_tuple("MappingWithKeys").field(keys).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ─── Item Parsers ────────────────────────────────────────────────────

/// How raw items become typed items.
pub struct ItemParser<T> {
    validator: Option<ValidatorFn>,
    candidates: Vec<(Shape, ItemFn<T>)>,
    default: ItemFn<T>,
}

impl<T> Clone for ItemParser<T> {
    fn clone(&self) -> Self {
        Self {
            validator: self.validator.clone(),
            candidates: self.candidates.clone(),
            default: Arc::clone(&self.default),
        }
    }
}

impl<T: Validatable + 'static> ItemParser<T> {
    /// Apply `parse` to every item.
    pub fn uniform<F>(parse: F) -> Self
    where
        F: Fn(&Value, &ValidationContext) -> Result<T, ParseError> + Send + Sync + 'static,
    {
        Self {
            validator: None,
            candidates: Vec::new(),
            default: Arc::new(parse),
        }
    }

    /// Use `parse` for items matching `shape`. Candidates are tried in the
    /// order they are added; the uniform parser is the fallback.
    pub fn shape<F>(mut self, shape: Shape, parse: F) -> Self
    where
        F: Fn(&Value, &ValidationContext) -> Result<T, ParseError> + Send + Sync + 'static,
    {
        self.candidates.push((shape, Arc::new(parse)));
        self
    }

    /// Drop items the predicate rejects.
    pub fn validator(mut self, validator: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    fn accepts(&self, item: &Value) -> bool {
        !is_falsy(item) && self.validator.as_ref().map_or(true, |v| v(item))
    }

    fn parse(&self, item: &Value, context: &ValidationContext) -> Result<T, ParseError> {
        let parse = self
            .candidates
            .iter()
            .find(|(shape, _)| shape.matches(item))
            .map_or(&self.default, |(_, parse)| parse);
        parse(item, context)
    }
}

impl<T: NakedSchemaObject> ItemParser<T> {
    /// Build each item as a schema object in a child context.
    pub fn object() -> Self {
        Self::uniform(|value, context| {
            T::build(value, context).map_err(|e| ParseError::new(e.to_string()))
        })
    }
}

impl<T> fmt::Debug for ItemParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemParser")
            .field("validator", &self.validator.is_some())
            .field(
                "candidates",
                &self.candidates.iter().map(|(s, _)| s).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Parse one item, recording a drop when it is skipped or rejected.
fn collect_item<T: Validatable + 'static>(
    key: &str,
    item: &Value,
    parser: &ItemParser<T>,
    context: &ValidationContext,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let parsed = if parser.accepts(item) {
        parser.parse(item, &context.child(key)).ok()
    } else {
        None
    };
    match parsed {
        Some(value) => {
            errors.merge(value.validation_errors());
            Some(value)
        }
        None => {
            let policy = Arc::new(ConfigOptionPolicy::new(context.clone(), key));
            errors.add(ConfigValueInvalidError::new(policy, item.clone()));
            None
        }
    }
}

// ─── List ────────────────────────────────────────────────────────────

/// Typed items parsed from a raw sequence, in source order.
pub struct SchemaObjectList<T> {
    context: ValidationContext,
    items: Vec<T>,
    errors: ValidationErrors,
}

impl<T: Validatable + 'static> SchemaObjectList<T> {
    pub fn build(
        content: &Value,
        context: &ValidationContext,
        parser: &ItemParser<T>,
    ) -> Result<Self, ParseError> {
        let raw = content
            .as_array()
            .ok_or_else(|| ParseError::new(format!("expected a sequence, got {content}")))?;
        let mut errors = ValidationErrors::new();
        let items = raw
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                collect_item(&index.to_string(), item, parser, context, &mut errors)
            })
            .collect();
        Ok(Self {
            context: context.clone(),
            items,
            errors,
        })
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn context(&self) -> &ValidationContext {
        &self.context
    }
}

impl<T> SchemaObjectList<T>
where
    T: Validatable + fmt::Debug + Send + Sync + 'static,
{
    /// A parser building this list from a nested sequence.
    pub fn parser(name: impl Into<String>, items: ItemParser<T>) -> Parser {
        Parser::nested(name, move |value, context| Self::build(value, context, &items))
    }
}

impl<T> Validatable for SchemaObjectList<T> {
    fn validation_errors(&self) -> &ValidationErrors {
        &self.errors
    }
}

impl<'a, T> IntoIterator for &'a SchemaObjectList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for SchemaObjectList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaObjectList")
            .field("context", &self.context.render())
            .field("items", &self.items)
            .field("errors", &self.errors.len())
            .finish()
    }
}

// ─── Set ─────────────────────────────────────────────────────────────

/// Typed items parsed from a raw mapping, keyed by name.
pub struct SchemaObjectSet<T> {
    context: ValidationContext,
    items: BTreeMap<String, T>,
    errors: ValidationErrors,
}

impl<T: Validatable + 'static> SchemaObjectSet<T> {
    pub fn build(
        content: &Value,
        context: &ValidationContext,
        parser: &ItemParser<T>,
    ) -> Result<Self, ParseError> {
        let raw = content
            .as_object()
            .ok_or_else(|| ParseError::new(format!("expected a mapping, got {content}")))?;
        Ok(Self::from_entries(
            raw.iter().map(|(k, v)| (k.as_str(), v)),
            context,
            parser,
        ))
    }

    fn from_entries<'v>(
        entries: impl Iterator<Item = (&'v str, &'v Value)>,
        context: &ValidationContext,
        parser: &ItemParser<T>,
    ) -> Self {
        let mut errors = ValidationErrors::new();
        let items = entries
            .filter_map(|(key, item)| {
                collect_item(key, item, parser, context, &mut errors).map(|v| (key.to_string(), v))
            })
            .collect();
        Self {
            context: context.clone(),
            items,
            errors,
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn context(&self) -> &ValidationContext {
        &self.context
    }
}

impl<T> SchemaObjectSet<T>
where
    T: Validatable + fmt::Debug + Send + Sync + 'static,
{
    /// A parser building this set from a nested mapping.
    pub fn parser(name: impl Into<String>, items: ItemParser<T>) -> Parser {
        Parser::nested(name, move |value, context| Self::build(value, context, &items))
    }
}

impl<T> Validatable for SchemaObjectSet<T> {
    fn validation_errors(&self) -> &ValidationErrors {
        &self.errors
    }
}

impl<T: fmt::Debug> fmt::Debug for SchemaObjectSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaObjectSet")
            .field("context", &self.context.render())
            .field("items", &self.items)
            .field("errors", &self.errors.len())
            .finish()
    }
}

// ─── Selectable Set ──────────────────────────────────────────────────

/// A set with a designated default member.
///
/// The raw mapping carries a `default` entry naming one sibling key. An
/// empty or absent lookup key returns that sibling.
pub struct SchemaSelectableObjectSet<T> {
    set: SchemaObjectSet<T>,
    default: String,
}

impl<T: Validatable + 'static> SchemaSelectableObjectSet<T> {
    pub fn build(
        content: &Value,
        context: &ValidationContext,
        parser: &ItemParser<T>,
    ) -> Result<Self, ParseError> {
        let raw = content
            .as_object()
            .ok_or_else(|| ParseError::new(format!("expected a mapping, got {content}")))?;
        let default = raw
            .get(DEFAULT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::new("selectable set has no 'default' key naming a member"))?;

        let set = SchemaObjectSet::from_entries(
            raw.iter()
                .filter(|(k, _)| k.as_str() != DEFAULT_KEY)
                .map(|(k, v)| (k.as_str(), v)),
            context,
            parser,
        );
        if !set.contains(default) {
            return Err(ParseError::new(format!(
                "default '{default}' does not name a valid member"
            )));
        }
        Ok(Self {
            set,
            default: default.to_string(),
        })
    }

    /// Look up a member; `None` or `""` selects the default.
    pub fn get(&self, key: Option<&str>) -> Option<&T> {
        match key {
            None | Some("") => self.set.get(&self.default),
            Some(key) => self.set.get(key),
        }
    }

    pub fn default_key(&self) -> &str {
        &self.default
    }

    pub fn default_item(&self) -> Option<&T> {
        self.set.get(&self.default)
    }

    pub fn set(&self) -> &SchemaObjectSet<T> {
        &self.set
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.set.keys()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl<T> SchemaSelectableObjectSet<T>
where
    T: Validatable + fmt::Debug + Send + Sync + 'static,
{
    /// A parser building this set from a nested mapping.
    pub fn parser(name: impl Into<String>, items: ItemParser<T>) -> Parser {
        Parser::nested(name, move |value, context| Self::build(value, context, &items))
    }
}

impl<T> Validatable for SchemaSelectableObjectSet<T> {
    fn validation_errors(&self) -> &ValidationErrors {
        self.set.validation_errors()
    }
}

impl<T: fmt::Debug> fmt::Debug for SchemaSelectableObjectSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSelectableObjectSet")
            .field("default", &self.default)
            .field("set", &self.set)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::processor::{Elements, SchemaProcessor};
    use docgate_core::Resolved;
    use serde_json::json;

    fn ctx() -> ValidationContext {
        ValidationContext::new("inventory.yaml").with_locality("Inventory")
    }

    fn names() -> ItemParser<String> {
        ItemParser::uniform(|value, _| {
            value
                .as_str()
                .map(str::to_uppercase)
                .ok_or_else(|| ParseError::new("expected a name"))
        })
    }

    #[test]
    fn test_list_drops_invalid_item_and_records_position() {
        let parser = names().validator(|v| v.as_str().is_some_and(|s| !s.starts_with('x')));
        let raw = json!(["a", "b", "xc", "d", "e"]);
        let list = SchemaObjectList::build(&raw, &ctx(), &parser).unwrap();
        assert_eq!(list.iter().cloned().collect::<Vec<_>>(), vec!["A", "B", "D", "E"]);

        let reports = list.validation_errors().render();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].headline, "'xc' Invalid for 2 in [Inventory] inventory.yaml");
    }

    #[test]
    fn test_falsy_items_are_dropped() {
        let raw = json!(["a", null, "", "b"]);
        let list = SchemaObjectList::build(&raw, &ctx(), &names()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.validation_errors().len(), 2);
    }

    #[test]
    fn test_shape_dispatch_with_default() {
        let parser = ItemParser::uniform(|_, _| Ok("default".to_string()))
            .shape(Shape::String, |v, _| Ok(format!("short:{}", v.as_str().unwrap_or(""))))
            .shape(Shape::mapping_with_keys(["name"]), |v, _| {
                Ok(format!("long:{}", v["name"].as_str().unwrap_or("")))
            });
        let raw = json!(["r1", {"name": "r2", "value": 10}, {"other": 1}, 5]);
        let list = SchemaObjectList::build(&raw, &ctx(), &parser).unwrap();
        assert_eq!(
            list.iter().cloned().collect::<Vec<_>>(),
            vec!["short:r1", "long:r2", "default", "default"]
        );
    }

    #[derive(Debug)]
    struct Net {
        processor: SchemaProcessor,
    }

    impl Validatable for Net {
        fn validation_errors(&self) -> &ValidationErrors {
            self.processor.errors()
        }
    }

    impl NakedSchemaObject for Net {
        const NAME: &'static str = "Net";

        fn elements(e: &mut Elements) {
            e.insert("name", e.option("name"));
            e.insert("width", e.option("width").parser(Parser::float()).default(1));
        }

        fn from_processor(processor: SchemaProcessor) -> Result<Self, SchemaError> {
            Ok(Self { processor })
        }
    }

    fn nets() -> ItemParser<Net> {
        ItemParser::<Net>::object().shape(Shape::String, |value, context| {
            Net::build(&json!({ "name": value }), context).map_err(|e| ParseError::new(e.to_string()))
        })
    }

    #[test]
    fn test_short_and_long_forms_build_same_object() {
        let raw = json!(["gnd", {"name": "vcc", "width": "wide"}, {"name": "sig", "width": 0.2}]);
        let list = SchemaObjectList::build(&raw, &ctx(), &nets()).unwrap();
        assert_eq!(list.len(), 3);

        let names: Vec<_> = list
            .iter()
            .map(|net| net.processor.get_str("name").unwrap().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["gnd", "vcc", "sig"]);

        let gnd = list.get(0).unwrap();
        assert_eq!(gnd.processor.get("width").unwrap().as_f64(), Some(1.0));
        assert_eq!(gnd.processor.context().render(), "[Inventory] inventory.yaml > 0");
        let sig = list.get(2).unwrap();
        assert_eq!(sig.processor.get("width").unwrap().as_f64(), Some(0.2));

        let reports = list.validation_errors().render();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].headline,
            "'wide' Invalid for width in [Inventory] inventory.yaml > 1"
        );
    }

    #[test]
    fn test_set_keys_and_errors() {
        let raw = json!({"left": "l", "right": 4, "mid": "m"});
        let set = SchemaObjectSet::build(&raw, &ctx(), &names()).unwrap();
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["left", "mid"]);
        assert_eq!(set.get("mid").map(String::as_str), Some("M"));
        let reports = set.validation_errors().render();
        assert_eq!(reports[0].headline, "'4' Invalid for right in [Inventory] inventory.yaml");
    }

    #[test]
    fn test_selectable_set_default_lookup() {
        let raw = json!({"default": "fast", "fast": "f", "slow": "s"});
        let set = SchemaSelectableObjectSet::build(&raw, &ctx(), &names()).unwrap();
        assert_eq!(set.default_key(), "fast");
        assert_eq!(set.get(None).map(String::as_str), Some("F"));
        assert_eq!(set.get(Some("")).map(String::as_str), Some("F"));
        assert_eq!(set.get(Some("slow")).map(String::as_str), Some("S"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_selectable_set_requires_valid_default() {
        let ctx = ctx();
        assert!(SchemaSelectableObjectSet::build(&json!({"a": "x"}), &ctx, &names()).is_err());
        assert!(
            SchemaSelectableObjectSet::build(&json!({"default": "b", "a": "x"}), &ctx, &names())
                .is_err()
        );
    }

    #[test]
    fn test_collection_parser_inside_policy() {
        let policy = Arc::new(
            ConfigOptionPolicy::new(ctx(), "parts").parser(SchemaObjectList::parser("parts", names())),
        );
        let resolved: Resolved = policy.get(&json!({"parts": ["a", 7]})).unwrap();
        let list = resolved.downcast_ref::<SchemaObjectList<String>>().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.context().render(), "[Inventory] inventory.yaml > parts");
        assert_eq!(resolved.validation_errors().map(ValidationErrors::len), Some(1));

        let err = policy.get(&json!({"parts": "a"})).unwrap_err();
        assert_eq!(err.render().group, "Configuration Value Unrecognized");
    }
}
