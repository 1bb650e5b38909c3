//! Error handling module for clipbatch

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for orchestrator operations
///
/// A worker that exits non-zero or is cancelled is not an error: those are
/// reported through [`RunOutcome`].
#[derive(Error, Debug)]
pub enum ClipBatchError {
    /// Invalid job, timeline or settings
    #[error("Invalid configuration: {0}")]
    Config(#[from] DomainError),

    /// The worker could not be started at all
    #[error("Failed to launch worker {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `run` called while another run is in flight
    #[error("A batch is already running")]
    AlreadyRunning,

    /// Media probe error
    #[error("Failed to probe media file: {message}")]
    Probe { message: String },

    /// Configuration file could not be read or parsed
    #[error("Failed to load config {path}: {message}")]
    ConfigFile { path: String, message: String },

    /// Payload serialization error
    #[error("Failed to serialize job payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for orchestrator operations
pub type ClipBatchResult<T> = std::result::Result<T, ClipBatchError>;

/// How a worker run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Exit code 0
    Completed,
    /// Non-zero exit, or killed by a signal (`code` is `None`)
    WorkerFailed {
        code: Option<i32>,
        /// Last lines the worker wrote to stderr
        stderr_tail: Vec<String>,
    },
    Cancelled,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    /// Message used for the batch error status
    pub fn failure_message(&self) -> Option<String> {
        match self {
            RunOutcome::WorkerFailed { code: Some(code), stderr_tail } => Some(match stderr_tail.last() {
                Some(line) => format!("worker exited with code {}: {}", code, line),
                None => format!("worker exited with code {}", code),
            }),
            RunOutcome::WorkerFailed { code: None, .. } => Some("worker terminated by signal".to_string()),
            _ => None,
        }
    }
}
