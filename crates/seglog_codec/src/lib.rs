//! # seglog Codec
//!
//! The record type stored in a seglog log and its byte encoding.
//!
//! The log stores each record as an opaque byte payload inside a store
//! frame. The frame carries the length, so the encoding here does not need
//! to be self-delimiting.
//!
//! ## Usage
//!
//! ```
//! use seglog_codec::{Decode, Encode, Record};
//!
//! let record = Record::new(b"hello world".to_vec()).with_offset(7);
//! let bytes = record.encode().unwrap();
//! assert_eq!(Record::decode(&bytes).unwrap(), record);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod record;

pub use error::{CodecError, CodecResult};
pub use record::Record;

/// Trait for types that can be encoded to bytes.
pub trait Encode {
    /// Encode this value to bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from bytes.
pub trait Decode: Sized {
    /// Decode a value from bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}
