//! Error types for seglog core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in log and segment operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store or index error, including end-of-data conditions.
    #[error("storage error: {0}")]
    Storage(#[from] seglog_storage::StorageError),

    /// Record codec error.
    #[error("codec error: {0}")]
    Codec(#[from] seglog_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested offset is not held by any segment.
    #[error("offset out of range: {offset} (log holds [{lowest}, {next}))")]
    OffsetOutOfRange {
        /// The requested offset.
        offset: u64,
        /// Lowest offset held by the log.
        lowest: u64,
        /// Next offset the log will assign.
        next: u64,
    },

    /// Configuration values are unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// The log has been removed and holds no segments.
    #[error("log is closed")]
    LogClosed,
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::OffsetOutOfRange`].
    ///
    /// This is the one failure a service layer reports to clients as a
    /// distinct status.
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OffsetOutOfRange { .. })
    }

    /// Returns true if the underlying cause is an end-of-data condition
    /// (store read past end, missing index entry, full index).
    #[must_use]
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_end_of_data())
    }
}
