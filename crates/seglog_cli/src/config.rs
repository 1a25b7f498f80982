//! Log configuration from a JSON file and command-line overrides.

use clap::Args;
use seglog_core::Config;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration options shared by every command.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// JSON file with `max_store_bytes`, `max_index_bytes`, `initial_offset`
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    /// Store size at which a segment is rotated out
    #[arg(global = true, long)]
    max_store_bytes: Option<u64>,

    /// Index file size per segment (12 bytes per record)
    #[arg(global = true, long)]
    max_index_bytes: Option<u64>,

    /// Offset of the first record in a new log
    #[arg(global = true, long)]
    initial_offset: Option<u64>,
}

impl ConfigArgs {
    /// Builds the log configuration: defaults, then the file, then flags.
    pub fn resolve(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load(path)?,
            None => Config::default(),
        };

        if let Some(bytes) = self.max_store_bytes {
            config.max_store_bytes = bytes;
        }
        if let Some(bytes) = self.max_index_bytes {
            config.max_index_bytes = bytes;
        }
        if let Some(offset) = self.initial_offset {
            config.initial_offset = offset;
        }

        Ok(config)
    }
}

fn load(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_without_options() {
        let config = ConfigArgs::default().resolve().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, r#"{"max_store_bytes": 4096, "initial_offset": 10}"#).unwrap();

        let args = ConfigArgs {
            config: Some(path),
            initial_offset: Some(20),
            ..ConfigArgs::default()
        };
        let config = args.resolve().unwrap();

        assert_eq!(config.max_store_bytes, 4096);
        assert_eq!(config.max_index_bytes, seglog_core::DEFAULT_MAX_BYTES);
        assert_eq!(config.initial_offset, 20);
    }

    #[test]
    fn missing_file_is_an_error() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/log.json")),
            ..ConfigArgs::default()
        };
        assert!(args.resolve().is_err());
    }
}
