//! Error types for the EdgePress client.
//!
//! Errors fall into two groups. Local errors (`Validation`, `Timeout`,
//! `PollingCancelled`, ...) are raised without any network involvement.
//! Transport errors (`Submission`, `Fetch`, `Network`, `Auth`) carry the
//! server-provided message when there is one.
//!
//! A job that *fails on the server* is not an error here: it comes back as a
//! task record whose status is `ERROR`.

use crate::task::TaskStatus;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the EdgePress client.
#[derive(Debug, Error)]
pub enum EdgePressError {
    // Local request validation
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Server-side rejection of a well-formed request
    #[error("Submission rejected{}: {message}", fmt_status(.status_code))]
    Submission {
        message: String,
        status_code: Option<u16>,
    },

    // Transport failure while reading task status
    #[error("Failed to fetch task status{}: {message}", fmt_status(.status_code))]
    Fetch {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Polling timed out after {elapsed:?}; last observed status was {last_status}")]
    Timeout {
        last_status: TaskStatus,
        elapsed: Duration,
    },

    #[error("Polling stopped by caller; last observed status was {last_status}")]
    PollingCancelled { last_status: TaskStatus },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Task {task_id} is {status}, expected FINISHED")]
    TaskNotFinished { task_id: String, status: TaskStatus },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

fn fmt_status(status_code: &Option<u16>) -> String {
    status_code
        .map(|code| format!(" (HTTP {})", code))
        .unwrap_or_default()
}

/// Result type alias for EdgePress operations.
pub type Result<T> = std::result::Result<T, EdgePressError>;

impl From<std::io::Error> for EdgePressError {
    fn from(err: std::io::Error) -> Self {
        EdgePressError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for EdgePressError {
    fn from(err: serde_json::Error) -> Self {
        EdgePressError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for EdgePressError {
    fn from(err: reqwest::Error) -> Self {
        EdgePressError::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl EdgePressError {
    /// Shorthand for a validation failure on `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EdgePressError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        EdgePressError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// HTTP status code reported by the server, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            EdgePressError::Submission { status_code, .. }
            | EdgePressError::Fetch { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// True for errors detected without talking to the server.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            EdgePressError::Validation { .. }
                | EdgePressError::Timeout { .. }
                | EdgePressError::PollingCancelled { .. }
                | EdgePressError::TaskNotFinished { .. }
                | EdgePressError::FileNotFound(_)
                | EdgePressError::Config { .. }
        )
    }

    /// Check if this error should trigger a retry.
    ///
    /// Server rejections are retryable only for the transient HTTP codes
    /// (408, 429 and 5xx gateway/unavailable responses).
    pub fn is_retryable(&self) -> bool {
        match self {
            EdgePressError::Network { .. } => true,
            EdgePressError::Fetch { status_code, .. }
            | EdgePressError::Submission { status_code, .. } => match status_code {
                None => matches!(self, EdgePressError::Fetch { .. }),
                Some(code) => matches!(code, 408 | 429 | 500 | 502 | 503 | 504),
            },
            _ => false,
        }
    }
}
