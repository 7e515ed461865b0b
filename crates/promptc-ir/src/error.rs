//! Errors raised while loading prompt documents.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoadError>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error in {file}: {source}")]
    Yaml {
        file: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("JSON error in {file}: {source}")]
    Json {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Invalid prompt in {file}: {message}")]
    Invalid { file: PathBuf, message: String },

    #[error("Cannot resolve '{reference}' from {file}: {message}")]
    Ref {
        file: PathBuf,
        reference: String,
        message: String,
    },

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),
}

impl LoadError {
    pub fn invalid(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        LoadError::Invalid {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}
