use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures that stop the application before any session exists.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Error loading '{}': {reason}", path.display())]
    Dataset { path: PathBuf, reason: String },

    #[error("dataset has {available} rows but {requested} examples were requested")]
    SampleSize { available: usize, requested: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

impl StartupError {
    pub fn dataset(path: &Path, reason: impl ToString) -> Self {
        Self::Dataset {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Any failure while calling the completion service.
///
/// These never halt a session: the loop renders them with [`CallError::as_reply`]
/// and records the text as the assistant's turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl CallError {
    /// Text inserted into the transcript in place of a generated reply.
    pub fn as_reply(&self) -> String {
        format!("Error calling OpenAI API: {self}")
    }
}

/// Rejected user input. Leaves the transcript untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    #[error("Please enter a message before sending.")]
    EmptyMessage,
}
