//! A segment: one store plus one index covering a contiguous offset range.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use seglog_codec::{Decode, Encode, Record};
use seglog_storage::layout::decode_len;
use seglog_storage::{Index, StorageError, Store, LEN_WIDTH};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// File extension of segment store files.
pub const STORE_EXTENSION: &str = "store";

/// File extension of segment index files.
pub const INDEX_EXTENSION: &str = "index";

/// Returns the path of the store file for the segment at `base_offset`.
#[must_use]
pub fn store_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{base_offset}.{STORE_EXTENSION}"))
}

/// Returns the path of the index file for the segment at `base_offset`.
#[must_use]
pub fn index_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{base_offset}.{INDEX_EXTENSION}"))
}

/// Summary of one segment, for inspection tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentInfo {
    /// First offset the segment holds.
    pub base_offset: u64,
    /// Next offset the segment would assign.
    pub next_offset: u64,
    /// Store size in bytes.
    pub store_size: u64,
    /// Number of index entries.
    pub index_entries: u64,
    /// Whether the segment has reached a size limit.
    pub maxed: bool,
}

/// A bounded piece of the log holding offsets `[base_offset, next_offset)`.
///
/// The segment translates global offsets into index slots, and index slots
/// into store positions. Both files are named after the base offset.
#[derive(Debug)]
pub struct Segment {
    store: Arc<Store>,
    index: Index,
    base_offset: u64,
    next_offset: u64,
    config: Config,
}

impl Segment {
    /// Opens the segment at `base_offset` in `dir`, creating its files if
    /// they do not exist.
    ///
    /// For an existing segment the next offset is derived from the last
    /// index entry, so a store frame written without its index entry stays
    /// unreachable.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened.
    pub fn open(dir: &Path, base_offset: u64, config: Config) -> CoreResult<Self> {
        let store = Store::open(&store_path(dir, base_offset))?;
        let index = Index::open(&index_path(dir, base_offset), config.max_index_bytes)?;

        trim_entries_past_store(&index, &store)?;

        let next_offset = match index.last_entry() {
            Ok((relative, _)) => base_offset + u64::from(relative) + 1,
            Err(e) if e.is_end_of_data() => base_offset,
            Err(e) => return Err(e.into()),
        };

        debug!(base_offset, next_offset, "opened segment");

        Ok(Self {
            store: Arc::new(store),
            index,
            base_offset,
            next_offset,
            config,
        })
    }

    /// Appends `record`, assigning it the segment's next offset.
    ///
    /// Returns the assigned offset. On failure the next offset is left
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexFull`] (an end-of-data condition) if the
    /// index has no room for another entry. Nothing is written in that case.
    pub fn append(&mut self, record: &mut Record) -> CoreResult<u64> {
        let offset = self.next_offset;
        let full = || StorageError::IndexFull {
            capacity: self.index.capacity(),
        };

        if self.index.is_full() {
            return Err(full().into());
        }
        let relative = u32::try_from(offset - self.base_offset).map_err(|_| full())?;

        record.offset = offset;
        let encoded = record.encode()?;

        let (_, position) = self.store.append(&encoded)?;
        self.index.write(relative, position)?;

        self.next_offset += 1;
        Ok(offset)
    }

    /// Reads the record at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OffsetOutOfRange`] if the segment holds no
    /// record at `offset`.
    pub fn read(&self, offset: u64) -> CoreResult<Record> {
        let out_of_range = || CoreError::OffsetOutOfRange {
            offset,
            lowest: self.base_offset,
            next: self.next_offset,
        };

        let relative = offset
            .checked_sub(self.base_offset)
            .and_then(|r| i64::try_from(r).ok())
            .ok_or_else(out_of_range)?;

        let (_, position) = match self.index.read(relative) {
            Ok(entry) => entry,
            Err(StorageError::IndexEntryMissing { .. }) => return Err(out_of_range()),
            Err(e) => return Err(e.into()),
        };

        let bytes = self.store.read(position)?;
        Ok(Record::decode(&bytes)?)
    }

    /// Returns true once the store or the index has reached its limit.
    #[must_use]
    pub fn is_maxed(&self) -> bool {
        self.store.size() >= self.config.max_store_bytes || self.index.is_full()
    }

    /// Returns true if `offset` lies in `[base_offset, next_offset)`.
    #[must_use]
    pub fn contains(&self, offset: u64) -> bool {
        self.base_offset <= offset && offset < self.next_offset
    }

    /// Returns the first offset this segment holds.
    #[must_use]
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Returns the offset the next append will be assigned.
    #[must_use]
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Returns the number of records in the segment.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.next_offset - self.base_offset
    }

    /// Returns true if the segment holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the store size in bytes.
    #[must_use]
    pub fn store_size(&self) -> u64 {
        self.store.size()
    }

    /// Returns a summary of the segment.
    #[must_use]
    pub fn info(&self) -> SegmentInfo {
        SegmentInfo {
            base_offset: self.base_offset,
            next_offset: self.next_offset,
            store_size: self.store.size(),
            index_entries: self.index.entries(),
            maxed: self.is_maxed(),
        }
    }

    /// Returns a shared handle to the store, for raw byte streaming.
    pub(crate) fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Closes the index, truncating it to its entries, then the store.
    ///
    /// # Errors
    ///
    /// Returns an error if either file fails to sync or truncate.
    pub fn close(&self) -> CoreResult<()> {
        self.index.close()?;
        self.store.close()?;
        Ok(())
    }

    /// Closes the segment and deletes both of its files.
    ///
    /// # Errors
    ///
    /// Returns an error if closing or deleting fails.
    pub fn remove(self) -> CoreResult<()> {
        self.close()?;
        remove_file(self.index.path())?;
        remove_file(self.store.path())?;
        debug!(base_offset = self.base_offset, "removed segment");
        Ok(())
    }
}

fn remove_file(path: &Path) -> CoreResult<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Drops trailing index entries whose frame is not wholly in the store.
/// Only an index that outlived its store's buffered writes has any.
fn trim_entries_past_store(index: &Index, store: &Store) -> CoreResult<()> {
    let store_size = store.size();
    let mut entries = index.entries();

    // Positions strictly increase, so once the last entry's frame is whole
    // every earlier frame is too.
    while entries > 0 {
        let (_, position) = index.read(entries as i64 - 1)?;
        if frame_is_complete(store, position, store_size)? {
            break;
        }
        entries -= 1;
    }

    if entries < index.entries() {
        warn!(
            path = %index.path().display(),
            kept = entries,
            dropped = index.entries() - entries,
            "index entries point past end of store"
        );
        index.discard_after(entries);
    }
    Ok(())
}

/// Returns true if the length prefix and the payload of the frame at
/// `position` both lie within the store.
fn frame_is_complete(store: &Store, position: u64, store_size: u64) -> CoreResult<bool> {
    let payload_start = match position.checked_add(LEN_WIDTH) {
        Some(start) if start <= store_size => start,
        _ => return Ok(false),
    };

    let mut prefix = [0u8; LEN_WIDTH as usize];
    if store.read_at(&mut prefix, position)? < prefix.len() {
        return Ok(false);
    }

    Ok(decode_len(prefix)
        .checked_add(payload_start)
        .is_some_and(|end| end <= store_size))
}
