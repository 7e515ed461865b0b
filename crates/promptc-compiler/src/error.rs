/// Error types for the prompt compiler

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Invalid schema at {path}: {message}")]
    Schema { path: String, message: String },

    #[error("Cannot read template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Formatting failed for {path}: {message}")]
    Formatting { path: String, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("I/O error writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<std::fmt::Error> for CompileError {
    fn from(e: std::fmt::Error) -> Self {
        CompileError::Unexpected(format!("writing generated source: {e}"))
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(e: serde_json::Error) -> Self {
        CompileError::Unexpected(format!("serializing prompt literal: {e}"))
    }
}

impl CompileError {
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn template_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::TemplateRead {
            path: path.into(),
            source,
        }
    }

    pub fn formatting(path: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::Formatting {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        CompileError::Unexpected(message.into())
    }
}
