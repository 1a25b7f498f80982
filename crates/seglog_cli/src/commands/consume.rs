//! Consume command implementation.

use super::{print_records, RecordInfo};
use seglog_core::{CoreResult, Log, Record};

/// Runs the consume command.
pub fn run(
    log: &Log,
    from: Option<u64>,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = consume(log, from, limit)?;
    let infos: Vec<RecordInfo> = records.iter().map(RecordInfo::from).collect();
    print_records(&infos, format)
}

/// Reads consecutive records starting at `from` until the log runs out.
///
/// A start offset that has been truncated away moves up to the lowest
/// offset still held.
fn consume(log: &Log, from: Option<u64>, limit: Option<usize>) -> CoreResult<Vec<Record>> {
    let mut offset = match from {
        Some(offset) => offset,
        None => log.lowest_offset()?,
    };
    let max_records = limit.unwrap_or(usize::MAX);
    let mut records = Vec::new();

    while records.len() < max_records {
        match log.read(offset) {
            Ok(record) => {
                records.push(record);
                offset += 1;
            }
            Err(e) if e.is_out_of_range() => {
                let lowest = log.lowest_offset()?;
                if offset >= lowest {
                    break;
                }
                offset = lowest;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}
