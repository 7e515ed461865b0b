//! Evaluation suites and the checks they run.

use serde_json::{Map, Value};

use crate::ir::Message;

/// Checks applied to every case, plus the cases themselves.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluationSuite {
    pub checks: Vec<Check>,
    pub evaluations: Vec<EvaluationCase>,
}

/// One conversation to run against a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationCase {
    pub name: Option<String>,
    pub messages: Vec<Message>,
    pub checks: Vec<Check>,
}

/// A single check with its optional display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub name: Option<String>,
    pub kind: CheckKind,
}

impl Check {
    pub fn new(kind: CheckKind) -> Self {
        Self { name: None, kind }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The check identifier as written in prompt documents.
    pub fn id(&self) -> &str {
        self.kind.id()
    }

    /// Display name, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.id())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckKind {
    ExactMatch {
        value: String,
        case_insensitive: bool,
    },
    ToolCall {
        tool_calls: Vec<ExpectedToolCall>,
    },
    StructuredOutput {
        result: Value,
    },
    Profanity {
        model: Option<String>,
        forbidden: Vec<String>,
    },
    Aligned {
        model: Option<String>,
        instructions: String,
    },
    /// A user-defined check, dispatched by id at evaluation time.
    Custom {
        id: String,
        model: Option<String>,
        options: Map<String, Value>,
    },
}

impl CheckKind {
    pub const EXACT_MATCH: &'static str = "exact_match";
    pub const TOOL_CALL: &'static str = "tool_call";
    pub const STRUCTURED_OUTPUT: &'static str = "structured_output";
    pub const PROFANITY: &'static str = "profanity";
    pub const ALIGNED: &'static str = "aligned";

    pub fn id(&self) -> &str {
        match self {
            CheckKind::ExactMatch { .. } => Self::EXACT_MATCH,
            CheckKind::ToolCall { .. } => Self::TOOL_CALL,
            CheckKind::StructuredOutput { .. } => Self::STRUCTURED_OUTPUT,
            CheckKind::Profanity { .. } => Self::PROFANITY,
            CheckKind::Aligned { .. } => Self::ALIGNED,
            CheckKind::Custom { id, .. } => id,
        }
    }

    /// Per-check model override, for checks graded by a model.
    pub fn model(&self) -> Option<&str> {
        match self {
            CheckKind::Profanity { model, .. }
            | CheckKind::Aligned { model, .. }
            | CheckKind::Custom { model, .. } => model.as_deref(),
            _ => None,
        }
    }
}

/// A tool call the completion is expected to make.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedToolCall {
    pub tool_name: String,
    pub args: Value,
}
