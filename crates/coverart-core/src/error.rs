//! Error types for the core crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Migration input is not an object (or is null) at the root.
    #[error("invalid document input: {reason}")]
    InvalidInput { reason: String },

    /// Input text is not JSON at all.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl CoreError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
