//! Error types for annotation and term index handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTML rewrite failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),

    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("Invalid attribute name '{name}': {reason}")]
    Attribute { name: String, reason: String },

    #[error("Term collision on '{key}': '{first}' and '{second}' normalize to the same identifier")]
    Collision {
        key: String,
        first: String,
        second: String,
    },

    #[error("Cannot load term index {path}: {reason}")]
    IndexLoad { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnnotateError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Read { .. } | Self::IndexLoad { .. } => 3,
            Self::Write { .. } => 4,
            Self::Selector { .. } | Self::Attribute { .. } => 2,
            Self::Collision { .. } => 5,
            Self::Rewrite(_) | Self::Serialization(_) => 1,
        }
    }
}

pub type AnnotateResult<T> = Result<T, AnnotateError>;
