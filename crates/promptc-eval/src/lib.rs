//! Evaluation checks for prompts.
//!
//! Runs the checks declared in a prompt's evaluation suite against a model
//! completion. Comparisons (exact match, tool calls, structured output) are
//! evaluated locally; model-graded checks go through a [`Judge`] supplied by
//! the caller, and custom checks through registered [`CustomCheck`]s.

mod checks;
mod completion;
mod context;
mod error;

pub use checks::{checks_for_case, resolve_model, run_case, run_check, CheckResult};
pub use completion::Completion;
pub use context::{CheckContext, CustomCheck, Judge};
pub use error::Error;

/// Result type for check operations.
pub type Result<T> = std::result::Result<T, Error>;
