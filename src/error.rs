use thiserror::Error;

use crate::marks::EditRequestStatus;

#[derive(Error, Debug)]
pub enum JudgeError {
    /// One or more numeric mark fields failed to parse. Raised before any write.
    #[error("invalid marks: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Missing or rejected credentials.
    #[error("authentication required: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("edit request {request_id} is {status} and cannot be reviewed")]
    InvalidTransition {
        request_id: String,
        status: EditRequestStatus,
    },

    /// Store or network failure. The caller decides whether to retry.
    #[error("store unavailable: {0}")]
    Transient(String),

    /// The store answered, but with data this build cannot use. Retrying
    /// will not help.
    #[error("unusable store data: {0}")]
    Store(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JudgeError {
    pub fn is_auth(&self) -> bool {
        matches!(self, JudgeError::Auth(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, JudgeError::Validation(_))
    }

    /// Only transient store failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JudgeError::Transient(_))
    }
}

pub type Result<T> = std::result::Result<T, JudgeError>;
