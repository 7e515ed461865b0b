//! The resolved prompt representation shared by the compiler and the checks.
//!
//! Everything here is plain data: schema references have already been
//! resolved and defaults applied by the document parser.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::check::EvaluationSuite;

/// A fully resolved prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Human label, e.g. "Simple Prompt". Never empty.
    pub name: String,
    /// Prompt version, at least 1.
    pub version: u32,
    /// Default model as `{provider}@{model}`.
    pub model: Option<String>,
    pub system_prompt: String,
    /// Sampling temperature in `[0, 2]`.
    pub temperature: f64,
    pub few_shot_messages: Vec<Message>,
    pub final_messages: Vec<Message>,
    pub tools: Vec<Tool>,
    /// Structured output schema.
    pub schema: Option<JsonSchema>,
    /// Evaluation cases. Only read by the check runner.
    pub evaluation: Option<EvaluationSuite>,
}

impl Prompt {
    /// A prompt with the given name and system text and every other field
    /// at its default.
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            model: None,
            system_prompt: system_prompt.into(),
            temperature: 0.0,
            few_shot_messages: Vec::new(),
            final_messages: Vec::new(),
            tools: Vec::new(),
            schema: None,
            evaluation: None,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_schema(mut self, schema: JsonSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_few_shot_message(mut self, message: Message) -> Self {
        self.few_shot_messages.push(message);
        self
    }

    pub fn with_final_message(mut self, message: Message) -> Self {
        self.final_messages.push(message);
        self
    }
}

/// A prompt together with the file it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptWithPath {
    pub path: PathBuf,
    pub prompt: Prompt,
}

/// A chat message, tagged on its role.
///
/// Serializes with camel-cased keys, the shape generated code embeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Message {
    User {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Assistant {
        content: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        tool_name: String,
        result: Value,
        is_error: bool,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
            name: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: String,
    /// Either the stringified JSON arguments or the structured value.
    pub arguments: Value,
}

/// A tool the model may call.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: JsonSchema,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: JsonSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A JSON Schema node.
///
/// Kept as an insertion-ordered JSON value so property order survives into
/// generated code. Nested nodes are reached through [`JsonSchema::get`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JsonSchema(Value);

impl JsonSchema {
    pub fn new(value: Value) -> Self {
        JsonSchema(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Look up a keyword on an object node.
    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(keyword))
    }

    /// The declared `type` keyword when it is a single string.
    pub fn kind(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }
}

impl From<Value> for JsonSchema {
    fn from(value: Value) -> Self {
        JsonSchema(value)
    }
}
