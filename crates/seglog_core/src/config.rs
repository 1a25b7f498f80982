//! Log configuration.

use crate::error::{CoreError, CoreResult};
use seglog_storage::ENTRY_WIDTH;
use serde::{Deserialize, Serialize};

/// Store and index limit applied when a limit is left at zero.
pub const DEFAULT_MAX_BYTES: u64 = 1024;

/// Configuration for opening a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store size at which a segment is rotated out.
    pub max_store_bytes: u64,

    /// Index file size, which bounds the records per segment to
    /// `max_index_bytes / 12`.
    pub max_index_bytes: u64,

    /// Offset of the first record in a brand-new log.
    pub initial_offset: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_store_bytes: DEFAULT_MAX_BYTES,
            max_index_bytes: DEFAULT_MAX_BYTES,
            initial_offset: 0,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store size at which segments rotate.
    #[must_use]
    pub const fn max_store_bytes(mut self, bytes: u64) -> Self {
        self.max_store_bytes = bytes;
        self
    }

    /// Sets the index file size.
    #[must_use]
    pub const fn max_index_bytes(mut self, bytes: u64) -> Self {
        self.max_index_bytes = bytes;
        self
    }

    /// Sets the offset of the first record in a new log.
    #[must_use]
    pub const fn initial_offset(mut self, offset: u64) -> Self {
        self.initial_offset = offset;
        self
    }

    /// Replaces zero limits with [`DEFAULT_MAX_BYTES`].
    #[must_use]
    pub const fn normalized(mut self) -> Self {
        if self.max_store_bytes == 0 {
            self.max_store_bytes = DEFAULT_MAX_BYTES;
        }
        if self.max_index_bytes == 0 {
            self.max_index_bytes = DEFAULT_MAX_BYTES;
        }
        self
    }

    /// Checks that the index can hold at least one entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `max_index_bytes` is smaller
    /// than one index entry.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_index_bytes < ENTRY_WIDTH {
            return Err(CoreError::invalid_config(format!(
                "max_index_bytes must be at least {ENTRY_WIDTH}, got {}",
                self.max_index_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.max_store_bytes, 1024);
        assert_eq!(config.max_index_bytes, 1024);
        assert_eq!(config.initial_offset, 0);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .max_store_bytes(33)
            .max_index_bytes(36)
            .initial_offset(16);

        assert_eq!(config.max_store_bytes, 33);
        assert_eq!(config.max_index_bytes, 36);
        assert_eq!(config.initial_offset, 16);
    }

    #[test]
    fn zero_limits_take_defaults() {
        let config = Config::new().max_store_bytes(0).max_index_bytes(0).normalized();
        assert_eq!(config.max_store_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(config.max_index_bytes, DEFAULT_MAX_BYTES);
    }

    #[test]
    fn tiny_index_rejected() {
        let err = Config::new().max_index_bytes(11).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
        assert!(Config::new().max_index_bytes(12).validate().is_ok());
    }

    #[test]
    fn deserialize_partial_json() {
        let config: Config = serde_json::from_str(r#"{"initial_offset": 5}"#).unwrap();
        assert_eq!(config.initial_offset, 5);
        assert_eq!(config.max_store_bytes, DEFAULT_MAX_BYTES);
    }
}
