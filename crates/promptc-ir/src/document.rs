//! Prompt document parser.
//!
//! Documents are YAML or JSON with snake_case keys. Each role, tool and
//! check is parsed into a strict tagged variant (unknown keys are errors)
//! and then lowered into the IR in [`crate::ir`], resolving `$ref` schema
//! files relative to the document.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::check::{Check, CheckKind, EvaluationCase, EvaluationSuite, ExpectedToolCall};
use crate::error::{LoadError, Result};
use crate::ir::{FunctionCall, JsonSchema, Message, Prompt, Tool, ToolCall};

/// Serialization format of a prompt document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Parse one prompt document.
///
/// `origin` is the document's path; `$ref` entries resolve against its
/// parent directory and errors name it.
pub fn parse_prompt(source: &str, format: Format, origin: &Path) -> Result<Prompt> {
    let doc: PromptDoc = match format {
        Format::Yaml => serde_yaml::from_str(source).map_err(|source| LoadError::Yaml {
            file: origin.to_path_buf(),
            source,
        })?,
        Format::Json => serde_json::from_str(source).map_err(|source| LoadError::Json {
            file: origin.to_path_buf(),
            source,
        })?,
    };
    Lowering::new(origin).prompt(doc)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PromptDoc {
    name: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default = "default_version")]
    version: i64,
    system_prompt: String,
    #[serde(default)]
    temperature: f64,
    #[serde(default)]
    few_shot_messages: Option<Vec<MessageDoc>>,
    #[serde(default)]
    final_messages: Option<Vec<MessageDoc>>,
    #[serde(default)]
    tools: Option<Vec<ToolDoc>>,
    #[serde(default)]
    schema: Option<Value>,
    #[serde(default)]
    evaluation: Option<EvaluationDoc>,
}

fn default_version() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum MessageDoc {
    User(UserDoc),
    Assistant(AssistantDoc),
    Tool(ToolResultDoc),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserDoc {
    content: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AssistantDoc {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDoc>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolCallDoc {
    id: String,
    function: FunctionDoc,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FunctionDoc {
    name: String,
    arguments: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolResultDoc {
    tool_call_id: String,
    tool_name: String,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    is_error: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolDoc {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EvaluationDoc {
    #[serde(default)]
    checks: Option<Value>,
    evaluations: Vec<EvaluationCaseDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EvaluationCaseDoc {
    #[serde(default)]
    name: Option<String>,
    messages: Vec<MessageDoc>,
    #[serde(default)]
    checks: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExactMatchDoc {
    value: String,
    #[serde(default)]
    case_insensitive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolCallCheckDoc {
    tool_calls: Vec<ExpectedToolCallDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExpectedToolCallDoc {
    tool_name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredOutputDoc {
    result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfanityDoc {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    forbidden: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AlignedDoc {
    #[serde(default)]
    model: Option<String>,
    instructions: String,
}

/// Lowers parsed documents into the IR for one origin file.
struct Lowering<'a> {
    origin: &'a Path,
}

impl<'a> Lowering<'a> {
    fn new(origin: &'a Path) -> Self {
        Self { origin }
    }

    fn invalid(&self, message: impl Into<String>) -> LoadError {
        LoadError::invalid(self.origin, message)
    }

    fn base_dir(&self) -> PathBuf {
        match self.origin.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn prompt(&self, doc: PromptDoc) -> Result<Prompt> {
        if doc.name.trim().is_empty() {
            return Err(self.invalid("`name` must not be empty"));
        }
        let version = u32::try_from(doc.version)
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| self.invalid(format!("`version` must be at least 1, got {}", doc.version)))?;
        if !(0.0..=2.0).contains(&doc.temperature) {
            return Err(self.invalid(format!(
                "`temperature` must be between 0 and 2, got {}",
                doc.temperature
            )));
        }
        if let Some(model) = &doc.model {
            if !model.contains('@') {
                return Err(self.invalid(format!(
                    "`model` must look like provider@model, got '{model}'"
                )));
            }
        }

        let few_shot_messages = self.message_list(doc.few_shot_messages, "few_shot_messages")?;
        let final_messages = self.message_list(doc.final_messages, "final_messages")?;

        let tools = match doc.tools {
            Some(tools) if tools.is_empty() => {
                return Err(self.invalid("`tools` must contain at least one tool when given"));
            }
            Some(tools) => tools
                .into_iter()
                .map(|tool| self.tool(tool))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let schema = doc
            .schema
            .map(|schema| self.schema(schema, "`schema`"))
            .transpose()?;

        let evaluation = doc.evaluation.map(|e| self.evaluation(e)).transpose()?;

        Ok(Prompt {
            name: doc.name,
            version,
            model: doc.model,
            system_prompt: doc.system_prompt,
            temperature: doc.temperature,
            few_shot_messages,
            final_messages,
            tools,
            schema,
            evaluation,
        })
    }

    fn message_list(&self, messages: Option<Vec<MessageDoc>>, field: &str) -> Result<Vec<Message>> {
        match messages {
            Some(messages) if messages.is_empty() => Err(self.invalid(format!(
                "`{field}` must contain at least one message when given"
            ))),
            Some(messages) => messages.into_iter().map(|m| self.message(m)).collect(),
            None => Ok(Vec::new()),
        }
    }

    fn message(&self, doc: MessageDoc) -> Result<Message> {
        Ok(match doc {
            MessageDoc::User(user) => Message::User {
                content: user.content,
                name: user.name,
            },
            MessageDoc::Assistant(assistant) => {
                let tool_calls = match assistant.tool_calls {
                    Some(calls) if calls.is_empty() => {
                        return Err(self.invalid("`tool_calls` must contain at least one call when given"));
                    }
                    Some(calls) => calls
                        .into_iter()
                        .map(|call| self.tool_call(call))
                        .collect::<Result<Vec<_>>>()?,
                    None => Vec::new(),
                };
                Message::Assistant {
                    content: assistant.content.unwrap_or_default(),
                    tool_calls,
                }
            }
            MessageDoc::Tool(result) => Message::Tool {
                tool_call_id: result.tool_call_id,
                tool_name: result.tool_name,
                result: result.result,
                is_error: result.is_error,
            },
        })
    }

    fn tool_call(&self, doc: ToolCallDoc) -> Result<ToolCall> {
        if let Some(kind) = &doc.kind {
            if kind != "function" {
                return Err(self.invalid(format!("tool call `type` must be \"function\", got '{kind}'")));
            }
        }
        Ok(ToolCall {
            id: doc.id,
            function: FunctionCall {
                name: doc.function.name,
                arguments: doc.function.arguments,
            },
        })
    }

    fn tool(&self, doc: ToolDoc) -> Result<Tool> {
        let what = format!("parameters of tool '{}'", doc.name);
        let parameters = self.schema(doc.parameters, &what)?;
        Ok(Tool {
            name: doc.name,
            description: doc.description,
            parameters,
        })
    }

    fn schema(&self, value: Value, what: &str) -> Result<JsonSchema> {
        let value = self.resolve_json(value)?;
        match &value {
            Value::Object(map) if map.contains_key("type") => Ok(JsonSchema::new(value)),
            _ => Err(self.invalid(format!(
                "{what} is not a JSON schema (expected an object with a `type` key)"
            ))),
        }
    }

    /// Resolve a `{"$ref": "file.json"}` (or `{"path": ...}`) reference or a
    /// stringified JSON document. Anything else is returned unchanged.
    fn resolve_json(&self, value: Value) -> Result<Value> {
        match value {
            Value::Object(map) if is_reference(&map) => {
                let reference = map
                    .get("$ref")
                    .or_else(|| map.get("path"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                self.read_reference(&reference)
            }
            Value::String(text) => serde_json::from_str(text.trim()).map_err(|source| LoadError::Json {
                file: self.origin.to_path_buf(),
                source,
            }),
            other => Ok(other),
        }
    }

    fn read_reference(&self, reference: &str) -> Result<Value> {
        let ref_error = |message: String| LoadError::Ref {
            file: self.origin.to_path_buf(),
            reference: reference.to_string(),
            message,
        };
        if !reference.ends_with(".json") {
            return Err(ref_error("must be a json file".to_string()));
        }
        let path = self.base_dir().join(reference);
        tracing::debug!(path = %path.display(), "resolving schema reference");
        let text = std::fs::read_to_string(&path).map_err(|e| ref_error(e.to_string()))?;
        serde_json::from_str(text.trim()).map_err(|e| ref_error(e.to_string()))
    }

    fn evaluation(&self, doc: EvaluationDoc) -> Result<EvaluationSuite> {
        if doc.evaluations.is_empty() {
            return Err(self.invalid("`evaluation.evaluations` must contain at least one case"));
        }
        let checks = self.checks(doc.checks)?;
        let evaluations = doc
            .evaluations
            .into_iter()
            .map(|case| {
                if case.messages.is_empty() {
                    return Err(self.invalid("evaluation `messages` must contain at least one message"));
                }
                Ok(EvaluationCase {
                    name: case.name,
                    messages: case
                        .messages
                        .into_iter()
                        .map(|m| self.message(m))
                        .collect::<Result<Vec<_>>>()?,
                    checks: self.checks(case.checks)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EvaluationSuite {
            checks,
            evaluations,
        })
    }

    /// Checks come either as a list of `{id, ...}` objects or as a map from
    /// id to options.
    fn checks(&self, value: Option<Value>) -> Result<Vec<Check>> {
        match value {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items.into_iter().map(|item| self.check(item)).collect(),
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(id, options)| {
                    let mut options = match options {
                        Value::Object(options) => options,
                        Value::Null => Map::new(),
                        _ => return Err(self.invalid(format!("options for check `{id}` must be a map"))),
                    };
                    options.insert("id".to_string(), Value::String(id));
                    self.check(Value::Object(options))
                })
                .collect(),
            Some(_) => Err(self.invalid("`checks` must be a list or a map")),
        }
    }

    fn check(&self, value: Value) -> Result<Check> {
        let Value::Object(mut map) = value else {
            return Err(self.invalid("a check must be a map"));
        };
        let id = match map.remove("id") {
            Some(Value::String(id)) => id,
            _ => return Err(self.invalid("a check is missing its string `id`")),
        };
        let name = match map.remove("name") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name),
            Some(_) => return Err(self.invalid(format!("`name` of check `{id}` must be a string"))),
        };

        let kind = match id.as_str() {
            CheckKind::EXACT_MATCH => {
                let doc: ExactMatchDoc = self.check_options(map, &id)?;
                CheckKind::ExactMatch {
                    value: doc.value,
                    case_insensitive: doc.case_insensitive,
                }
            }
            CheckKind::TOOL_CALL => {
                let doc: ToolCallCheckDoc = self.check_options(map, &id)?;
                CheckKind::ToolCall {
                    tool_calls: doc
                        .tool_calls
                        .into_iter()
                        .map(|call| ExpectedToolCall {
                            tool_name: call.tool_name,
                            args: call.args,
                        })
                        .collect(),
                }
            }
            CheckKind::STRUCTURED_OUTPUT => {
                let doc: StructuredOutputDoc = self.check_options(map, &id)?;
                CheckKind::StructuredOutput {
                    result: self.resolve_json(doc.result)?,
                }
            }
            CheckKind::PROFANITY => {
                let doc: ProfanityDoc = self.check_options(map, &id)?;
                if doc.forbidden.as_ref().is_some_and(Vec::is_empty) {
                    return Err(self.invalid("`forbidden` must list at least one word when given"));
                }
                CheckKind::Profanity {
                    model: doc.model,
                    forbidden: doc.forbidden.unwrap_or_default(),
                }
            }
            CheckKind::ALIGNED => {
                let doc: AlignedDoc = self.check_options(map, &id)?;
                CheckKind::Aligned {
                    model: doc.model,
                    instructions: doc.instructions,
                }
            }
            _ => {
                let model = match map.remove("model") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(model)) => Some(model),
                    Some(_) => return Err(self.invalid(format!("`model` of check `{id}` must be a string"))),
                };
                CheckKind::Custom {
                    id,
                    model,
                    options: map,
                }
            }
        };
        Ok(Check { name, kind })
    }

    fn check_options<T: DeserializeOwned>(&self, map: Map<String, Value>, id: &str) -> Result<T> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| self.invalid(format!("check `{id}`: {e}")))
    }
}

fn is_reference(map: &Map<String, Value>) -> bool {
    if map.len() != 1 {
        return false;
    }
    ["$ref", "path"]
        .iter()
        .any(|key| map.get(*key).is_some_and(Value::is_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_yaml(source: &str) -> Result<Prompt> {
        parse_prompt(source, Format::Yaml, Path::new("fixtures/test_prompt.yaml"))
    }

    #[test]
    fn test_minimal_prompt_gets_defaults() {
        let prompt = parse_yaml("name: Simple Prompt\nsystem_prompt: You are helpful.\n").unwrap();
        assert_eq!(prompt.name, "Simple Prompt");
        assert_eq!(prompt.version, 1);
        assert_eq!(prompt.temperature, 0.0);
        assert!(prompt.model.is_none());
        assert!(prompt.tools.is_empty());
        assert!(prompt.schema.is_none());
    }

    #[test]
    fn test_messages_are_tagged_by_role() {
        let prompt = parse_yaml(
            r#"
name: chat
system_prompt: hi
few_shot_messages:
  - role: user
    content: What's the weather?
    name: example_user
  - role: assistant
    content: ""
    tool_calls:
      - id: call_1
        type: function
        function:
          name: lookup_weather
          arguments: '{"city": "Oslo"}'
  - role: tool
    tool_call_id: call_1
    tool_name: lookup_weather
    result: { temp: 3 }
"#,
        )
        .unwrap();

        assert_eq!(prompt.few_shot_messages.len(), 3);
        assert_eq!(
            prompt.few_shot_messages[0],
            Message::User {
                content: "What's the weather?".into(),
                name: Some("example_user".into()),
            }
        );
        match &prompt.few_shot_messages[1] {
            Message::Assistant { tool_calls, .. } => {
                assert_eq!(tool_calls[0].function.name, "lookup_weather");
                assert_eq!(tool_calls[0].function.arguments, json!("{\"city\": \"Oslo\"}"));
            }
            other => panic!("expected assistant message, got {:?}", other),
        }
        match &prompt.few_shot_messages[2] {
            Message::Tool { result, is_error, .. } => {
                assert_eq!(result, &json!({"temp": 3}));
                assert!(!is_error);
            }
            other => panic!("expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = parse_yaml("name: x\nsystem_prompt: y\nfinal_messages:\n  - role: system\n    content: z\n")
            .unwrap_err();
        assert!(matches!(err, LoadError::Yaml { .. }));
    }

    #[test]
    fn test_unknown_message_key_is_rejected() {
        let err = parse_yaml("name: x\nsystem_prompt: y\nfinal_messages:\n  - role: user\n    content: z\n    extra: 1\n")
            .unwrap_err();
        assert!(matches!(err, LoadError::Yaml { .. }));
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        assert!(matches!(
            parse_yaml("name: ''\nsystem_prompt: y\n"),
            Err(LoadError::Invalid { .. })
        ));
        assert!(matches!(
            parse_yaml("name: x\nversion: 0\nsystem_prompt: y\n"),
            Err(LoadError::Invalid { .. })
        ));
        assert!(matches!(
            parse_yaml("name: x\ntemperature: 2.5\nsystem_prompt: y\n"),
            Err(LoadError::Invalid { .. })
        ));
        assert!(matches!(
            parse_yaml("name: x\nsystem_prompt: y\ntools: []\n"),
            Err(LoadError::Invalid { .. })
        ));
    }

    #[test]
    fn test_inline_and_stringified_tool_parameters() {
        let prompt = parse_yaml(
            r#"
name: tools
system_prompt: y
tools:
  - name: tool a
    description: first
    parameters:
      type: object
      properties:
        a: { type: boolean }
      required: [a]
  - name: tool b
    description: second
    parameters: '{"type": "string"}'
"#,
        )
        .unwrap();
        assert_eq!(prompt.tools[0].parameters.kind(), Some("object"));
        assert_eq!(prompt.tools[1].parameters.as_value(), &json!({"type": "string"}));
    }

    #[test]
    fn test_schema_without_type_is_rejected() {
        let err = parse_yaml("name: x\nsystem_prompt: y\nschema:\n  properties: {}\n").unwrap_err();
        assert!(err.to_string().contains("not a JSON schema"));
    }

    #[test]
    fn test_non_json_reference_is_rejected() {
        let err = parse_yaml("name: x\nsystem_prompt: y\nschema:\n  $ref: ./schema.yaml\n").unwrap_err();
        assert!(matches!(err, LoadError::Ref { .. }));
    }

    #[test]
    fn test_checks_in_list_and_map_form() {
        let prompt = parse_yaml(
            r#"
name: x
system_prompt: y
evaluation:
  checks:
    exact_match:
      value: Hello
      case_insensitive: true
  evaluations:
    - name: greets
      messages:
        - role: user
          content: hi
      checks:
        - id: aligned
          name: polite
          instructions: Be polite.
        - id: my_custom
          threshold: 3
"#,
        )
        .unwrap();
        let suite = prompt.evaluation.unwrap();
        assert_eq!(
            suite.checks[0].kind,
            CheckKind::ExactMatch {
                value: "Hello".into(),
                case_insensitive: true,
            }
        );
        let case = &suite.evaluations[0];
        assert_eq!(case.checks[0].display_name(), "polite");
        match &case.checks[1].kind {
            CheckKind::Custom { id, options, .. } => {
                assert_eq!(id, "my_custom");
                assert_eq!(options.get("threshold"), Some(&json!(3)));
            }
            other => panic!("expected custom check, got {:?}", other),
        }
    }

    #[test]
    fn test_json_documents_parse() {
        let prompt = parse_prompt(
            r#"{"name": "json prompt", "system_prompt": "s", "version": 3, "model": "openai@gpt-4o-mini"}"#,
            Format::Json,
            Path::new("p.json"),
        )
        .unwrap();
        assert_eq!(prompt.version, 3);
        assert_eq!(prompt.model.as_deref(), Some("openai@gpt-4o-mini"));
    }
}
