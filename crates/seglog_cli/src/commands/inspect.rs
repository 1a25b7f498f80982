//! Inspect command implementation.

use seglog_core::{Log, SegmentInfo};
use serde::Serialize;

/// Log layout for output.
#[derive(Debug, Serialize)]
pub struct LogReport {
    /// Log directory.
    pub dir: String,
    /// Lowest offset held.
    pub lowest_offset: u64,
    /// Highest offset held, if any record is held.
    pub highest_offset: Option<u64>,
    /// Offset the next append gets.
    pub next_offset: u64,
    /// Total bytes across store files.
    pub store_bytes: u64,
    /// Per-segment details, oldest first.
    pub segments: Vec<SegmentInfo>,
}

/// Runs the inspect command.
pub fn run(log: &Log, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = build_report(log)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_text_output(&report);
        }
    }

    Ok(())
}

fn build_report(log: &Log) -> Result<LogReport, Box<dyn std::error::Error>> {
    let segments = log.segments();
    Ok(LogReport {
        dir: log.dir().display().to_string(),
        lowest_offset: log.lowest_offset()?,
        highest_offset: log.highest_offset()?,
        next_offset: log.next_offset()?,
        store_bytes: segments.iter().map(|s| s.store_size).sum(),
        segments,
    })
}

fn print_text_output(report: &LogReport) {
    println!("=== seglog Log ===");
    println!("Directory:      {}", report.dir);
    println!("Lowest offset:  {}", report.lowest_offset);
    match report.highest_offset {
        Some(highest) => println!("Highest offset: {highest}"),
        None => println!("Highest offset: (empty)"),
    }
    println!("Next offset:    {}", report.next_offset);
    println!("Store bytes:    {}", report.store_bytes);
    println!();
    println!("Segments ({}):", report.segments.len());
    println!(
        "  {:>12}  {:>12}  {:>10}  {:>8}  maxed",
        "base", "next", "bytes", "entries"
    );
    for segment in &report.segments {
        println!(
            "  {:>12}  {:>12}  {:>10}  {:>8}  {}",
            segment.base_offset,
            segment.next_offset,
            segment.store_size,
            segment.index_entries,
            if segment.maxed { "yes" } else { "no" }
        );
    }
}
