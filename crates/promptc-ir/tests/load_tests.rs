//! Integration tests for prompt discovery and reference resolution

use std::fs;

use promptc_ir::{load_prompts, load_schema_file, CheckKind, LoadError, DEFAULT_PATTERN};
use serde_json::json;

#[test]
fn test_discovers_yaml_and_yml_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("b_prompt.yaml"), "name: b\nsystem_prompt: s\n").unwrap();
    fs::write(dir.path().join("nested/a_prompt.yml"), "name: a\nsystem_prompt: s\n").unwrap();
    fs::write(dir.path().join("notes.yaml"), "not: a prompt\n").unwrap();

    let prompts = load_prompts(dir.path(), DEFAULT_PATTERN).unwrap();
    let names: Vec<_> = prompts.iter().map(|p| p.prompt.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[test]
fn test_no_matches_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let prompts = load_prompts(dir.path(), DEFAULT_PATTERN).unwrap();
    assert!(prompts.is_empty());
}

#[test]
fn test_resolves_schema_references_relative_to_prompt() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("weather/schemas")).unwrap();
    fs::write(
        dir.path().join("weather/schemas/params.json"),
        r#"{"type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("weather/expected.json"),
        r#"{"city": "Oslo"}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("weather/weather_prompt.yaml"),
        r#"
name: Weather
system_prompt: Answer weather questions.
tools:
  - name: lookup_weather
    description: Look up the weather.
    parameters:
      $ref: schemas/params.json
schema:
  $ref: ./schemas/params.json
evaluation:
  evaluations:
    - messages:
        - role: user
          content: Oslo?
      checks:
        - id: structured_output
          result:
            path: expected.json
"#,
    )
    .unwrap();

    let prompts = load_prompts(dir.path(), DEFAULT_PATTERN).unwrap();
    let prompt = &prompts[0].prompt;
    assert_eq!(
        prompt.tools[0].parameters.as_value(),
        &json!({"type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]})
    );
    assert_eq!(prompt.schema.as_ref().unwrap().kind(), Some("object"));

    let case = &prompt.evaluation.as_ref().unwrap().evaluations[0];
    assert_eq!(
        case.checks[0].kind,
        CheckKind::StructuredOutput {
            result: json!({"city": "Oslo"})
        }
    );
}

#[test]
fn test_missing_reference_names_the_reference() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("broken_prompt.yaml"),
        "name: broken\nsystem_prompt: s\nschema:\n  $ref: missing.json\n",
    )
    .unwrap();

    let err = load_prompts(dir.path(), DEFAULT_PATTERN).unwrap_err();
    match err {
        LoadError::Ref { reference, .. } => assert_eq!(reference, "missing.json"),
        other => panic!("expected reference error, got {:?}", other),
    }
}

#[test]
fn test_standalone_schema_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("answer.yaml");
    fs::write(&path, "type: object\nproperties:\n  ok:\n    type: boolean\n").unwrap();

    let schema = load_schema_file(&path).unwrap();
    assert_eq!(schema.kind(), Some("object"));
    assert_eq!(schema.as_value()["properties"]["ok"]["type"], "boolean");

    let err = load_schema_file(dir.path().join("answer.txt")).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat(_)));
}
