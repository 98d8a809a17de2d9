//! # Policy Resolution Tests
//!
//! Resolves a handful of policies against one realistic document and
//! checks that failures accumulate independently of each other: one bad
//! field never prevents its neighbours from resolving.

use std::sync::Arc;

use docgate_core::{
    ConfigOptionPolicy, Parser, Resolved, SchemaPolicy, SchemaVersion, ValidationContext,
    ValidationError, ValidationErrors,
};
use serde_json::json;

fn document() -> serde_json::Value {
    json!({
        "schema": {"name": "Project", "version": 1.2},
        "name": "amplifier",
        "power": {"rail": "12V", "budget_mw": "250"},
        "stage": "tapeout",
    })
}

#[test]
fn test_independent_failures_accumulate() {
    let ctx = ValidationContext::new("amplifier.yaml").with_locality("Project");
    let policies = vec![
        ConfigOptionPolicy::new(ctx.clone(), "name"),
        ConfigOptionPolicy::new(ctx.clone(), ["power", "budget_mw"]).parser(Parser::integer()),
        ConfigOptionPolicy::new(ctx.clone(), "stage").options(["draft", "review"]),
        ConfigOptionPolicy::new(ctx.clone(), "owner"),
        ConfigOptionPolicy::new(ctx.clone(), "notes").optional().warning(),
    ];

    let mut errors = ValidationErrors::new();
    let mut resolved: Vec<Resolved> = Vec::new();
    for policy in policies {
        match Arc::new(policy).get(&document()) {
            Ok(value) => resolved.push(value),
            Err(e) => errors.add(e),
        }
    }

    assert_eq!(resolved.len(), 3);
    assert_eq!(resolved[0].as_str(), Some("amplifier"));
    assert_eq!(resolved[1].as_i64(), Some(250));
    assert!(resolved[2].is_none());

    assert_eq!(errors.terrors(), 2);
    let reports = errors.render();
    assert_eq!(reports[0].group, "Configuration Value Unrecognized");
    assert_eq!(
        reports[0].headline,
        "'tapeout' Invalid for stage in [Project] amplifier.yaml"
    );
    assert!(reports[0].detail.contains("Valid options are draft, review"));
    assert_eq!(reports[1].headline, "owner missing in [Project] amplifier.yaml");
}

#[test]
fn test_schema_declaration_against_policy() {
    let ctx = ValidationContext::new("amplifier.yaml");
    let name = Arc::new(ConfigOptionPolicy::new(ctx.clone(), ["schema", "name"]));
    let version =
        Arc::new(ConfigOptionPolicy::new(ctx.clone(), ["schema", "version"]).parser(Parser::version()));

    let doc = document();
    let name = name.get(&doc).unwrap();
    let version = version.get(&doc).unwrap();
    let version = version.as_version().unwrap();

    let v = |s: &str| SchemaVersion::parse(s).unwrap();
    let accepts = SchemaPolicy::new(ctx.clone(), "Project", v("1.0"), v("1.2")).unwrap();
    let rejects = SchemaPolicy::new(ctx, "Project", v("1.3"), v("2.0")).unwrap();

    assert!(accepts.validate(name.as_str().unwrap(), version));
    assert!(!rejects.validate(name.as_str().unwrap(), version));
}

#[test]
fn test_empty_document_is_unreadable_not_missing() {
    let ctx = ValidationContext::new("empty.yaml");
    let policy = Arc::new(ConfigOptionPolicy::new(ctx, ["schema", "name"]));
    let err = policy.get(&serde_json::Value::Null).unwrap_err();
    assert!(matches!(err, ValidationError::DocumentInvalid(_)));
    assert_eq!(
        err.render().headline,
        "Expected a mapping to read schema/name in empty.yaml, got null"
    );
}
