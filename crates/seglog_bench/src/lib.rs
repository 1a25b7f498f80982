//! Benchmark utilities.

use rand::Rng;
use seglog_core::{Config, Log, Record};
use tempfile::TempDir;

/// Generate random record data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Open a log in a fresh temporary directory.
///
/// The directory is returned alongside the log to keep it alive.
pub fn temp_log(config: Config) -> (TempDir, Log) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let log = Log::open(dir.path(), config).expect("Failed to open log");
    (dir, log)
}

/// Open a log and fill it with `count` records of `size` bytes.
pub fn filled_log(config: Config, count: u64, size: usize) -> (TempDir, Log) {
    let (dir, log) = temp_log(config);
    let data = random_data(size);
    for _ in 0..count {
        log.append(Record::new(data.clone()))
            .expect("Failed to append");
    }
    (dir, log)
}

/// Segment limits large enough that rotation stays rare.
pub fn large_segments() -> Config {
    Config::new()
        .max_store_bytes(64 * 1024 * 1024)
        .max_index_bytes(12 * 1024 * 1024)
}
