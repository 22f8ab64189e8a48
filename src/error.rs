//! Error types for docviz-client
//!
//! This module provides the error taxonomy for the task lifecycle:
//! - Connectivity failures ([`Error::Network`]) and non-success HTTP responses
//!   ([`Error::Transport`]) raised by the transport layer
//! - Job-level outcomes ([`Error::Job`], [`Error::Timeout`]) raised by the poller
//! - State machine contract violations ([`ObservationError`])
//! - Machine-readable error codes for surfacing failures to a UI

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::{TaskId, TaskState};

/// Result type alias for docviz-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of characters of a non-JSON error body kept in [`Error::Transport`]
const MAX_DETAIL_CHARS: usize = 512;

/// Main error type for docviz-client
///
/// Each variant maps to one class of failure a caller may want to react to
/// differently (offer a manual retry, show the server's message, report a bug).
#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity failure (DNS, refused connection, reset). Never retried automatically.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status
    #[error("service returned HTTP {status}: {detail}")]
    Transport {
        /// HTTP status code of the response
        status: u16,
        /// Server-provided detail (FastAPI `detail` field or raw body)
        detail: String,
    },

    /// The server reported `status = error` for the task
    #[error("job failed: {message}")]
    Job {
        /// Message reported by the server, verbatim
        message: String,
    },

    /// The polling budget was exhausted before the task reached a terminal state
    #[error("task did not finish after {attempts} status polls")]
    Timeout {
        /// Number of polls that were issued
        attempts: u32,
    },

    /// A single status request exceeded the configured per-request timeout
    #[error("status request timed out after {timeout:?}")]
    RequestTimeout {
        /// The configured per-request timeout
        timeout: Duration,
    },

    /// The status stream violated the task state machine contract
    #[error("inconsistent status observation: {0}")]
    Observation(#[from] ObservationError),

    /// The run was cancelled by the caller
    #[error("polling cancelled")]
    Cancelled,

    /// The file was rejected before upload
    #[error("invalid upload: {reason}")]
    InvalidUpload {
        /// Why the file was rejected
        reason: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// The artifact's local file name is already taken
    #[error("file collision at {path}: {reason}")]
    FileCollision {
        /// The path where the collision occurred
        path: PathBuf,
        /// Why no usable path could be produced
        reason: String,
    },

    /// A response body could not be decoded into the expected shape
    #[error("failed to decode {what}: {reason}")]
    Decode {
        /// What was being decoded (e.g., "status response")
        what: &'static str,
        /// Decoder error message
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Contract violations detected by [`TaskStatusMachine`](crate::state_machine::TaskStatusMachine)
///
/// These are distinct from ordinary job failure: they indicate the server (or a
/// reordering proxy) produced a status stream that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationError {
    /// A snapshot tried to move a terminal task to a different state
    #[error("task {task_id} is already {from}, refusing transition to {to}")]
    TerminalRegression {
        /// Task whose state was regressed
        task_id: TaskId,
        /// Terminal state already observed
        from: TaskState,
        /// State reported by the offending snapshot
        to: TaskState,
    },

    /// A snapshot belongs to a different task than the one being tracked
    #[error("snapshot for task {actual} fed to machine tracking task {expected}")]
    TaskMismatch {
        /// Task tracked by the machine
        expected: TaskId,
        /// Task id carried by the snapshot
        actual: TaskId,
    },
}

impl Error {
    /// Build a [`Error::Transport`] from a status code and a raw response body
    ///
    /// FastAPI error bodies look like `{"detail": "..."}`; when the body has that
    /// shape only the detail string is kept. Anything else is kept verbatim,
    /// truncated to a sane length.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let detail = match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => match map.get("detail") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => truncate(body),
            },
            _ => truncate(body),
        };

        Error::Transport { status, detail }
    }

    /// HTTP status associated with this error, if the service produced one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error is a terminal job failure reported by the server
    pub fn is_job_failure(&self) -> bool {
        matches!(self, Error::Job { .. })
    }

    /// Machine-readable error code, stable across releases
    ///
    /// Presentation layers can key user-facing messages off this value.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Network(_) => "network_error",
            Error::Transport { status: 404, .. } => "not_found",
            Error::Transport { .. } => "transport_error",
            Error::Job { .. } => "job_failed",
            Error::Timeout { .. } => "timeout",
            Error::RequestTimeout { .. } => "request_timeout",
            Error::Observation(ObservationError::TerminalRegression { .. }) => {
                "terminal_regression"
            }
            Error::Observation(ObservationError::TaskMismatch { .. }) => "task_mismatch",
            Error::Cancelled => "cancelled",
            Error::InvalidUpload { .. } => "invalid_upload",
            Error::Config { .. } => "config_error",
            Error::FileCollision { .. } => "file_collision",
            Error::Decode { .. } => "decode_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_DETAIL_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_DETAIL_CHARS).collect();
    out.push('…');
    out
}
