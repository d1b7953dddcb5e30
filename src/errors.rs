//! Typed error hierarchy for the Tasker client.
//!
//! Two top-level enums cover the two layers:
//! - `ApiError`: failures reported by the task API collaborator
//! - `BoardError`: board, cache, and detail-session failures

use thiserror::Error;

/// Errors from the task API collaborator.
///
/// The variants follow the server's status classes: transport problems and
/// 5xx responses are `Network`, 401 is `Auth`, every other 4xx is
/// `Validation`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected ({status}): {detail}")]
    Validation { status: u16, detail: String },

    #[error("Not authenticated: {0}")]
    Auth(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify an HTTP error status and the server's `detail` message.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            401 => Self::Auth(detail),
            400..=499 => Self::Validation { status, detail },
            _ => Self::Network(format!("HTTP {}: {}", status, detail)),
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Decode(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Errors from the board runtime and the task detail session.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Task {id} not found")]
    TaskNotFound { id: i64 },

    #[error("No project selected")]
    NoProjectSelected,

    #[error("Invalid {field} '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}
