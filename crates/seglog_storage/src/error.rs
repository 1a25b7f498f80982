//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during store and index operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of the store.
    #[error("read beyond end of store: position {position}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read position.
        position: u64,
        /// The requested read length.
        len: u64,
        /// The current store size.
        size: u64,
    },

    /// The index holds no entry at the requested slot.
    #[error("no index entry {entry}: index holds {entries} entries")]
    IndexEntryMissing {
        /// The requested entry (relative offset, `-1` for the last entry).
        entry: i64,
        /// Number of valid entries in the index.
        entries: u64,
    },

    /// The index has no room for another entry.
    #[error("index full: capacity {capacity} entries")]
    IndexFull {
        /// Number of entries the mapped region can hold.
        capacity: u64,
    },

    /// The store or index has been closed.
    #[error("storage is closed")]
    Closed,
}

impl StorageError {
    /// Returns true if this error is an end-of-data condition.
    ///
    /// End-of-data covers reads past the last frame or entry and writes into
    /// a full index. Callers use it as an EOF or rotation signal rather than
    /// a fatal failure.
    #[must_use]
    pub fn is_end_of_data(&self) -> bool {
        matches!(
            self,
            Self::ReadPastEnd { .. } | Self::IndexEntryMissing { .. } | Self::IndexFull { .. }
        )
    }
}
