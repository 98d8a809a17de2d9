//! # Stub Generation Integration Tests
//!
//! A document kind with a template gets its file created on first open,
//! and the generated stub must pass the kind's own schema gate.

use docgate_core::Validatable;
use docgate_schema::{
    DocumentLoader, Elements, SchemaControlledDocument, SchemaError, SchemaSupport,
};

const TEMPLATE: &str = "\
schema:
  name: {{ stage.schema_name }}
  version: {{ stage.schema_version }}

title: Untitled
";

fn no_elements(_: &mut Elements) {}

#[test]
fn test_stub_round_trip_passes_own_gate() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("project.yaml.tpl");
    std::fs::write(&template, TEMPLATE).unwrap();
    let target = dir.path().join("project.yaml");

    let support = SchemaSupport::new("Project", "1.0", "1.2").unwrap().template(&template);
    let document = SchemaControlledDocument::open(
        &DocumentLoader::default(),
        &target,
        &support,
        no_elements,
        true,
    )
    .unwrap();

    assert!(target.exists());
    assert!(document.is_valid(), "{}", document.errors());
    assert_eq!(document.schema_name(), Some("Project"));
    assert_eq!(
        document.schema_version().map(ToString::to_string).as_deref(),
        Some("1.2")
    );

    let written = std::fs::read_to_string(&target).unwrap();
    assert!(written.starts_with("schema:\n  name: Project\n  version: 1.2\n"));
}

#[test]
fn test_existing_document_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("project.yaml.tpl");
    std::fs::write(&template, TEMPLATE).unwrap();
    let target = dir.path().join("project.yaml");
    let original = "schema:\n  name: Project\n  version: 1.0\ntitle: Kept\n";
    std::fs::write(&target, original).unwrap();

    let support = SchemaSupport::new("Project", "1.0", "1.2").unwrap().template(&template);
    let document =
        SchemaControlledDocument::open(&DocumentLoader::default(), &target, &support, no_elements, true)
            .unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), original);
    assert_eq!(document.schema_version().map(ToString::to_string).as_deref(), Some("1.0"));
}

#[test]
fn test_missing_template_is_stub_error() {
    let dir = tempfile::tempdir().unwrap();
    let support = SchemaSupport::new("Project", "1.0", "1.2")
        .unwrap()
        .template(dir.path().join("absent.tpl"));
    let err = SchemaControlledDocument::open(
        &DocumentLoader::default(),
        &dir.path().join("project.yaml"),
        &support,
        no_elements,
        false,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::StubGeneration { .. }));
}

#[test]
fn test_optional_document_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let support = SchemaSupport::new("Project", "1.0", "1.2").unwrap().require_exists(false);
    let document = SchemaControlledDocument::open(
        &DocumentLoader::default(),
        &dir.path().join("absent.yaml"),
        &support,
        no_elements,
        false,
    )
    .unwrap();

    let groups: Vec<String> = document.errors().render().into_iter().map(|r| r.group).collect();
    assert_eq!(
        groups,
        vec![
            "Configuration Document Unreadable",
            "Configuration Document Unreadable",
            "The file specifies a schema which is not supported.",
        ]
    );
}

#[test]
fn test_required_document_without_template_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let support = SchemaSupport::new("Project", "1.0", "1.2").unwrap();
    let err = SchemaControlledDocument::open(
        &DocumentLoader::default(),
        &dir.path().join("absent.yaml"),
        &support,
        no_elements,
        false,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::DocumentNotFound { .. }));
}
