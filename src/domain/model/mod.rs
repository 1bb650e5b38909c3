// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// A file taking part in a batch.
///
/// The id is the file name; every worker event refers to the file by it, so it
/// has to be unique within one batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaFileRef {
    pub id: String,
    pub path: PathBuf,
}

impl MediaFileRef {
    /// Create a reference keyed by the path's file name
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                DomainError::BadArgs(format!("Path has no file name: {}", path.display()))
            })?;
        Ok(Self { id, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Audio track details reported by the prober
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    pub codec: Option<String>,
}

/// Probed media metadata; immutable once assigned to a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Duration in seconds
    pub duration: f64,
    /// Frames per second
    pub frame_rate: f64,
    /// Bits per second
    pub bit_rate: u64,
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub audio: Option<AudioInfo>,
}

impl Metadata {
    /// Create metadata with validation
    pub fn new(
        duration: f64,
        frame_rate: f64,
        bit_rate: u64,
        width: u32,
        height: u32,
        video_codec: String,
    ) -> Result<Self, DomainError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(DomainError::BadArgs("Duration cannot be negative".to_string()));
        }
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(DomainError::BadArgs("Frame rate must be positive".to_string()));
        }
        if width == 0 || height == 0 {
            return Err(DomainError::BadArgs("Video dimensions cannot be zero".to_string()));
        }

        Ok(Self {
            duration,
            frame_rate,
            bit_rate,
            width,
            height,
            video_codec,
            audio: None,
        })
    }

    /// Attach audio track details
    pub fn with_audio(mut self, audio: AudioInfo) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Per-file processing state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error(String),
}

impl FileStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Error(_))
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Pending => write!(f, "pending"),
            FileStatus::Processing => write!(f, "processing"),
            FileStatus::Completed => write!(f, "completed"),
            FileStatus::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// Progress of one file in the running batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProgress {
    pub id: String,
    pub status: FileStatus,
    pub segments_completed: u32,
    pub segments_total: u32,
    pub output_dir: Option<String>,
    /// Single output file, for operations that produce one (GIF export)
    pub output_path: Option<String>,
    pub output_size: Option<String>,
}

impl FileProgress {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: FileStatus::Pending,
            segments_completed: 0,
            segments_total: 0,
            output_dir: None,
            output_path: None,
            output_size: None,
        }
    }
}

/// Successful/failed file counts for a finished batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub successful: u32,
    pub failed: u32,
}

/// Aggregate status of the current batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchStatus {
    Idle,
    Running,
    Completed { successful: u32, failed: u32 },
    Error { message: String },
    Cancelled,
}

impl BatchStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, BatchStatus::Running)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Idle => write!(f, "idle"),
            BatchStatus::Running => write!(f, "running"),
            BatchStatus::Completed { successful, failed } => {
                write!(f, "completed ({} succeeded / {} failed)", successful, failed)
            }
            BatchStatus::Error { message } => write!(f, "error: {}", message),
            BatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
