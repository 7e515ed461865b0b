//! Error types for check evaluation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The judge does not know how to reach this model.
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// A custom check id with no registered implementation.
    #[error("no check registered for id '{0}'")]
    UnknownCheck(String),

    /// The judge failed to grade a completion.
    #[error("judge failed: {0}")]
    Judge(String),
}
