//! Prompt IR for promptc.
//!
//! Prompt documents (YAML or JSON) are parsed through strict tagged
//! variants and lowered into [`Prompt`] values with every schema reference
//! resolved. The compiler and the check runner only ever see the IR.

pub mod check;
pub mod document;
pub mod error;
pub mod ir;
pub mod load;

pub use check::{Check, CheckKind, EvaluationCase, EvaluationSuite, ExpectedToolCall};
pub use document::{parse_prompt, Format};
pub use error::{LoadError, Result};
pub use ir::{FunctionCall, JsonSchema, Message, Prompt, PromptWithPath, Tool, ToolCall};
pub use load::{discover, load_prompt_file, load_prompts, load_schema_file, DEFAULT_PATTERN};
