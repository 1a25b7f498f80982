//! Truncate command implementation.

use seglog_core::Log;
use tracing::info;

/// Runs the truncate command.
pub fn run(log: &Log, lowest: u64) -> Result<(), Box<dyn std::error::Error>> {
    let before = log.segment_count();
    log.truncate(lowest)?;

    info!(
        "Truncated at {}: {} segments removed, lowest offset now {}",
        lowest,
        before.saturating_sub(log.segment_count()),
        log.lowest_offset()?
    );
    Ok(())
}
