//! CLI command implementations.

pub mod append;
pub mod consume;
pub mod dump;
pub mod inspect;
pub mod read;
pub mod reset;
pub mod truncate;

use seglog_core::Record;
use serde::Serialize;

/// Record representation for output.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Offset in the log.
    pub offset: u64,
    /// Value, with invalid UTF-8 replaced.
    pub value: String,
    /// Value size in bytes.
    pub size: usize,
}

impl From<&Record> for RecordInfo {
    fn from(record: &Record) -> Self {
        Self {
            offset: record.offset,
            value: String::from_utf8_lossy(&record.value).into_owned(),
            size: record.value.len(),
        }
    }
}

fn print_records(records: &[RecordInfo], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        _ => {
            for record in records {
                println!("{:>10}  {:>6}B  {}", record.offset, record.size, record.value);
            }
        }
    }
    Ok(())
}
