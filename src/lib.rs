//! clipbatch library
//!
//! Batch media processing coordinated around an external worker process: job
//! payload construction, the worker's JSON-lines event protocol, per-file
//! progress tracking, cancellation, and the trim/cut timeline used by GIF
//! export.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod job;
pub mod ports;
pub mod protocol;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{BatchStatus, FileProgress, FileStatus, MediaFileRef, Metadata};
pub use domain::timeline::Timeline;
pub use engine::{ProgressTracker, WorkerCommand, WorkerController};
pub use error::{ClipBatchError, ClipBatchResult, RunOutcome};
pub use job::JobConfiguration;
pub use protocol::{decode, WorkerEvent};
