//! Application errors.

use leaderline_core::LeaderLineError;
use thiserror::Error;

/// Errors from loading, editing or writing a scene.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scene parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown selector: {0}")]
    UnknownSelector(String),
    #[error("Duplicate element id: {0}")]
    DuplicateElement(String),
    #[error("Invalid drag `{0}`, expected <selector>:<dx>,<dy>")]
    InvalidDrag(String),
    #[error(transparent)]
    Line(#[from] LeaderLineError),
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
