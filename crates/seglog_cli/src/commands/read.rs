//! Read command implementation.

use super::{print_records, RecordInfo};
use seglog_core::Log;

/// Runs the read command.
pub fn run(log: &Log, offset: u64, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let record = log.read(offset)?;
    print_records(&[RecordInfo::from(&record)], format)
}
