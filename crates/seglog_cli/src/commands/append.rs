//! Append command implementation.

use seglog_core::{Log, Record};
use tracing::info;

/// Runs the append command.
pub fn run(log: &Log, values: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    for value in values {
        let offset = log.append(Record::new(value.as_bytes()))?;
        println!("{offset}");
    }

    info!("Appended {} records", values.len());
    Ok(())
}
