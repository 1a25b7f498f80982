//! On-disk byte layout for store frames and index entries.
//!
//! All integers are big-endian.
//!
//! ```text
//! store frame:  | length (8) | payload (length) |
//! index entry:  | relative offset (4) | store position (8) |
//! ```

/// Width of the length prefix in front of every store frame.
pub const LEN_WIDTH: u64 = 8;

/// Width of the relative-offset field of an index entry.
pub const OFFSET_WIDTH: u64 = 4;

/// Width of the store-position field of an index entry.
pub const POSITION_WIDTH: u64 = 8;

/// Width of one index entry.
pub const ENTRY_WIDTH: u64 = OFFSET_WIDTH + POSITION_WIDTH;

/// Encodes the length prefix of a frame carrying `payload_len` bytes.
#[must_use]
pub const fn encode_len(payload_len: u64) -> [u8; LEN_WIDTH as usize] {
    payload_len.to_be_bytes()
}

/// Decodes a frame length prefix.
#[must_use]
pub const fn decode_len(bytes: [u8; LEN_WIDTH as usize]) -> u64 {
    u64::from_be_bytes(bytes)
}

/// Encodes one index entry.
#[must_use]
pub fn encode_entry(offset: u32, position: u64) -> [u8; ENTRY_WIDTH as usize] {
    let mut entry = [0u8; ENTRY_WIDTH as usize];
    entry[..OFFSET_WIDTH as usize].copy_from_slice(&offset.to_be_bytes());
    entry[OFFSET_WIDTH as usize..].copy_from_slice(&position.to_be_bytes());
    entry
}

/// Decodes one index entry.
///
/// # Panics
///
/// Panics if `bytes` is shorter than [`ENTRY_WIDTH`]; callers slice exactly
/// one entry out of the mapped region.
#[must_use]
pub fn decode_entry(bytes: &[u8]) -> (u32, u64) {
    let mut offset = [0u8; OFFSET_WIDTH as usize];
    let mut position = [0u8; POSITION_WIDTH as usize];
    offset.copy_from_slice(&bytes[..OFFSET_WIDTH as usize]);
    position.copy_from_slice(&bytes[OFFSET_WIDTH as usize..ENTRY_WIDTH as usize]);
    (u32::from_be_bytes(offset), u64::from_be_bytes(position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_is_big_endian() {
        let entry = encode_entry(1, 0x0102);
        assert_eq!(entry, [0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0x01, 0x02]);
        assert_eq!(decode_entry(&entry), (1, 0x0102));
    }

    #[test]
    fn len_prefix_is_big_endian() {
        assert_eq!(encode_len(11), [0, 0, 0, 0, 0, 0, 0, 11]);
        assert_eq!(decode_len(encode_len(u64::MAX)), u64::MAX);
    }
}
