//! Collaborators a check run needs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use promptc_ir::Check;

use crate::checks::CheckResult;
use crate::completion::Completion;
use crate::Result;

/// Grades completions with a language model.
///
/// Implementations return [`crate::Error::UnknownModel`] for a model they
/// cannot reach; the check is then recorded as failed rather than aborting.
pub trait Judge: Send + Sync {
    /// Whether `output` contains profanity or any of the `forbidden` words.
    fn has_profanity(&self, model: &str, forbidden: &[String], output: &str) -> Result<bool>;

    /// Whether `output` follows `instructions`.
    fn is_aligned(&self, model: &str, instructions: &str, output: &str) -> Result<bool>;
}

/// A user-defined check, looked up by the id used in prompt documents.
pub trait CustomCheck: Send + Sync {
    fn id(&self) -> &str;

    fn run(&self, check: &Check, completion: &Completion, ctx: &CheckContext) -> Result<CheckResult>;
}

/// Everything a check may consult besides the completion itself.
#[derive(Clone, Default)]
pub struct CheckContext {
    /// Model used by graded checks without their own override
    pub default_model: Option<String>,
    pub judge: Option<Arc<dyn Judge>>,
    pub custom: BTreeMap<String, Arc<dyn CustomCheck>>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Register `check` under its own id, replacing any previous one.
    pub fn with_custom_check(mut self, check: Arc<dyn CustomCheck>) -> Self {
        self.custom.insert(check.id().to_string(), check);
        self
    }
}

impl fmt::Debug for CheckContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckContext")
            .field("default_model", &self.default_model)
            .field("judge", &self.judge.is_some())
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}
