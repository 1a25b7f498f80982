//! # seglog Storage
//!
//! The two file types a log segment is made of.
//!
//! - [`Store`] - an append-only file of length-prefixed payloads
//! - [`Index`] - a memory-mapped file of fixed-width entries mapping a
//!   segment-relative offset to a store position
//!
//! Neither type knows about records, segments or global offsets. Payloads
//! are opaque bytes; the layer above owns their encoding.
//!
//! ## Example
//!
//! ```no_run
//! use seglog_storage::{Index, Store};
//! use std::path::Path;
//!
//! let store = Store::open(Path::new("16.store")).unwrap();
//! let index = Index::open(Path::new("16.index"), 1024).unwrap();
//!
//! let (_, position) = store.append(b"hello world").unwrap();
//! index.write(0, position).unwrap();
//!
//! let (_, position) = index.read(0).unwrap();
//! assert_eq!(store.read(position).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod index;
pub mod layout;
mod store;

pub use error::{StorageError, StorageResult};
pub use index::{Index, LAST_ENTRY};
pub use layout::{ENTRY_WIDTH, LEN_WIDTH};
pub use store::Store;
