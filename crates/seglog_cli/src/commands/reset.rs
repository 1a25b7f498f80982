//! Reset command implementation.

use seglog_core::Log;
use tracing::info;

/// Runs the reset command.
pub fn run(log: &Log) -> Result<(), Box<dyn std::error::Error>> {
    info!("Resetting log at {:?}", log.dir());
    log.reset()?;
    println!("Log reset; next offset {}", log.next_offset()?);
    Ok(())
}
