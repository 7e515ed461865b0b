//! Running the checks declared in prompt documents

use std::fs;
use std::path::Path;
use std::sync::Arc;

use promptc_eval::{run_case, CheckContext, Completion, Judge, Result};
use promptc_ir::{load_prompt_file, parse_prompt, Format, FunctionCall, ToolCall};
use serde_json::json;

const WEATHER: &str = r#"
name: Weather
model: openai@gpt-4o
system_prompt: Answer about the weather.
evaluation:
  checks:
    - id: profanity
      forbidden: [drat]
  evaluations:
    - name: looks up the city
      messages:
        - role: user
          content: Weather in Oslo?
      checks:
        - id: tool_call
          tool_calls:
            - tool_name: lookup_weather
              args:
                city: Oslo
    - name: says hello
      messages:
        - role: user
          content: Greet me
      checks:
        exact_match:
          value: hello!
          case_insensitive: true
"#;

struct WordJudge;

impl Judge for WordJudge {
    fn has_profanity(&self, _model: &str, forbidden: &[String], output: &str) -> Result<bool> {
        Ok(forbidden.iter().any(|word| output.contains(word.as_str())))
    }

    fn is_aligned(&self, _model: &str, _instructions: &str, _output: &str) -> Result<bool> {
        Ok(true)
    }
}

#[test]
fn test_document_checks_run_against_completions() {
    let prompt = parse_prompt(WEATHER, Format::Yaml, Path::new("weather.prompt.yaml")).unwrap();
    let suite = prompt.evaluation.as_ref().unwrap();
    let ctx = CheckContext::new()
        .with_default_model(prompt.model.clone().unwrap())
        .with_judge(Arc::new(WordJudge));

    let lookup = Completion::text("").with_tool_call(ToolCall {
        id: "call_1".to_string(),
        function: FunctionCall {
            name: "lookup_weather".to_string(),
            arguments: json!("{\"city\":\"Oslo\"}"),
        },
    });
    let results = run_case(suite, &suite.evaluations[0], &lookup, &ctx).unwrap();
    let outcomes: Vec<_> = results.iter().map(|r| (r.name.as_str(), r.success)).collect();
    assert_eq!(outcomes, vec![("profanity", true), ("tool_call", true)]);
    assert_eq!(results[0].data["model"], "openai@gpt-4o");

    let rude = Completion::text("Hello! Drat, drat.");
    let results = run_case(suite, &suite.evaluations[1], &rude, &ctx).unwrap();
    let outcomes: Vec<_> = results.iter().map(|r| (r.name.as_str(), r.success)).collect();
    assert_eq!(outcomes, vec![("profanity", false), ("exact_match", false)]);

    let polite = Completion::text("HELLO!");
    let results = run_case(suite, &suite.evaluations[1], &polite, &ctx).unwrap();
    assert!(results.iter().all(|r| r.success));
}

#[test]
fn test_results_serialize_for_reports() {
    let prompt = parse_prompt(WEATHER, Format::Yaml, Path::new("weather.prompt.yaml")).unwrap();
    let suite = prompt.evaluation.as_ref().unwrap();
    let ctx = CheckContext::new().with_judge(Arc::new(WordJudge));

    // No default model and no override: graded checks fail instead of erroring.
    let results = run_case(suite, &suite.evaluations[1], &Completion::text("hello!"), &ctx).unwrap();
    let report = serde_json::to_value(&results).unwrap();
    assert_eq!(
        report,
        json!([
            { "name": "profanity", "success": false, "data": { "model": null } },
            { "name": "exact_match", "success": true, "data": { "case_insensitive": true } }
        ])
    );
}

#[test]
fn test_expected_output_is_read_from_a_referenced_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("expected")).unwrap();
    fs::write(
        dir.path().join("expected/spam.json"),
        r#"{ "label": "spam", "score": 1 }"#,
    )
    .unwrap();
    let path = dir.path().join("classify.prompt.yaml");
    fs::write(
        &path,
        r#"
name: Classify
system_prompt: Label the message.
evaluation:
  evaluations:
    - messages:
        - role: user
          content: Buy now!!!
      checks:
        - id: structured_output
          result:
            $ref: expected/spam.json
"#,
    )
    .unwrap();

    let loaded = load_prompt_file(&path).unwrap();
    let suite = loaded.prompt.evaluation.as_ref().unwrap();
    let ctx = CheckContext::new();

    let matching = Completion::Structured(json!({ "score": 1.0, "label": "spam" }));
    let results = run_case(suite, &suite.evaluations[0], &matching, &ctx).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].data["check"], json!({ "label": "spam", "score": 1 }));

    let wrong = Completion::Structured(json!({ "label": "ham", "score": 1 }));
    let results = run_case(suite, &suite.evaluations[0], &wrong, &ctx).unwrap();
    assert!(!results[0].success);
}
