use promptc_ir::ToolCall;
use serde_json::Value;

/// What a model produced for one evaluation case.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Free text plus any tool calls the model made.
    Text { text: String, tool_calls: Vec<ToolCall> },
    /// A structured-output response.
    Structured(Value),
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Completion::Text {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_call(self, call: ToolCall) -> Self {
        match self {
            Completion::Text { text, mut tool_calls } => {
                tool_calls.push(call);
                Completion::Text { text, tool_calls }
            }
            structured => structured,
        }
    }

    /// The completion as text; structured output is rendered as JSON.
    pub fn as_text(&self) -> String {
        match self {
            Completion::Text { text, .. } => text.clone(),
            Completion::Structured(value) => value.to_string(),
        }
    }

    /// The completion as a JSON value, for recording in results.
    pub fn to_value(&self) -> Value {
        match self {
            Completion::Text { text, .. } => Value::String(text.clone()),
            Completion::Structured(value) => value.clone(),
        }
    }
}
