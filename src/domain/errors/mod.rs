// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// Invalid time range
    InvalidTimeRange(String),
    /// No cut segment with the given id
    UnknownSegment(u64),
    /// Trim window has no room for another cut segment
    WindowTooNarrow(String),
    /// Override value does not match the operation it was given for
    UnsupportedOverride(String),
    /// Edit rejected because a batch is running
    Busy(String),
    /// Validation failed
    ValidationFailed(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::InvalidTimeRange(msg) => write!(f, "Invalid time range: {}", msg),
            DomainError::UnknownSegment(id) => write!(f, "Unknown cut segment: {}", id),
            DomainError::WindowTooNarrow(msg) => write!(f, "Trim window too narrow: {}", msg),
            DomainError::UnsupportedOverride(msg) => write!(f, "Unsupported override: {}", msg),
            DomainError::Busy(msg) => write!(f, "Busy: {}", msg),
            DomainError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
