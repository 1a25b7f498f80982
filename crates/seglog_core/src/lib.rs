//! # seglog Core
//!
//! A segmented, append-only commit log.
//!
//! This crate provides:
//! - [`Log`] - one logical, unbounded sequence of records addressed by offset
//! - [`Segment`] - a bounded store + index pair holding a contiguous offset range
//! - [`LogReader`] - a raw byte stream over every segment's store
//! - [`Config`] - size limits and the initial offset
//!
//! ## Directory Layout
//!
//! ```text
//! <log_dir>/
//! ├─ 0.store      # frames for offsets [0, 3)
//! ├─ 0.index
//! ├─ 3.store      # active segment
//! └─ 3.index
//! ```
//!
//! ## Invariants
//!
//! - Offsets are assigned by the log, start at the configured initial
//!   offset and increase by one per append with no gaps
//! - Segment offset ranges are contiguous and never overlap
//! - A record is never modified after it is appended
//! - Reopening a closed log yields the same offsets and records

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod log;
mod reader;
mod segment;

pub use config::{Config, DEFAULT_MAX_BYTES};
pub use error::{CoreError, CoreResult};
pub use log::Log;
pub use reader::LogReader;
pub use segment::{
    index_path, store_path, Segment, SegmentInfo, INDEX_EXTENSION, STORE_EXTENSION,
};
pub use seglog_codec::Record;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
