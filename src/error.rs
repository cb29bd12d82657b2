//! Error type returned by tool handlers.
//!
//! Callers tell the kinds apart by the message prefix alone, so the
//! `Display` strings are part of the tool contract.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Missing or wrong-shape argument.
    #[error("invalid argument: {0}")]
    Validation(String),
    /// File or component does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Requested location is outside the readable corpus.
    #[error("path violation: {0}")]
    PathViolation(String),
    #[error("internal error: {0}")]
    Unexpected(String),
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation(_) => "validation",
            ToolError::NotFound(_) => "not_found",
            ToolError::PathViolation(_) => "path_violation",
            ToolError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Unexpected(e.to_string())
    }
}
