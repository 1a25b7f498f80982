//! Memory-mapped offset index.
//!
//! The index maps a segment-relative offset to the position of the record's
//! frame in the paired store. Entries are fixed width, so entry `i` lives at
//! byte `i * ENTRY_WIDTH` and always describes relative offset `i`.
//!
//! A memory mapping cannot grow, so the backing file is extended to the
//! configured maximum before it is mapped. [`Index::close`] truncates it back
//! to the bytes actually written, which makes the file size the entry count
//! for the next open.

use crate::error::{StorageError, StorageResult};
use crate::layout::{decode_entry, encode_entry, ENTRY_WIDTH};
use memmap2::MmapMut;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Sentinel for [`Index::read`] selecting the last written entry.
pub const LAST_ENTRY: i64 = -1;

/// A fixed-capacity, memory-mapped index file.
///
/// # Thread Safety
///
/// Reads and writes serialize on one internal mutex guarding the mapped
/// region and the logical size.
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    capacity: u64,
    state: Mutex<IndexState>,
}

#[derive(Debug)]
struct IndexState {
    /// `None` once the index has been closed.
    mapping: Option<Mapping>,
    /// Number of valid bytes, always a multiple of `ENTRY_WIDTH`.
    size: u64,
}

#[derive(Debug)]
struct Mapping {
    file: File,
    mmap: MmapMut,
}

#[allow(unsafe_code)]
fn map_file(file: &File) -> io::Result<MmapMut> {
    // SAFETY: the index exclusively owns `file` for the lifetime of the
    // mapping and drops the mapping before the file is truncated.
    unsafe { MmapMut::map_mut(file) }
}

/// Counts the leading entries that form a valid sequence: entry `i` stores
/// relative offset `i` and store positions strictly increase.
fn valid_prefix(mmap: &[u8], size: u64) -> u64 {
    let mut previous = None;
    let mut entries = 0;

    while (entries + 1) * ENTRY_WIDTH <= size {
        let start = (entries * ENTRY_WIDTH) as usize;
        let (offset, position) = decode_entry(&mmap[start..start + ENTRY_WIDTH as usize]);

        if u64::from(offset) != entries || previous.is_some_and(|p| position <= p) {
            break;
        }

        previous = Some(position);
        entries += 1;
    }

    entries * ENTRY_WIDTH
}

impl Index {
    /// Opens or creates an index file able to hold `max_bytes` of entries.
    ///
    /// An index that was not closed cleanly still has its over-allocated
    /// size; only its valid entry prefix is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, resized or mapped.
    pub fn open(path: &Path, max_bytes: u64) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let file_len = file.metadata()?.len();
        let written = file_len - file_len % ENTRY_WIDTH;

        // Never shrink below entries already on disk.
        let map_len = max_bytes.max(written);
        file.set_len(map_len)?;
        let mmap = map_file(&file)?;

        let size = valid_prefix(&mmap, written);
        if size != file_len {
            warn!(
                path = %path.display(),
                file_len,
                valid = size / ENTRY_WIDTH,
                "index was not closed cleanly, ignoring entries past the valid prefix"
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            capacity: map_len / ENTRY_WIDTH,
            state: Mutex::new(IndexState {
                mapping: Some(Mapping { file, mmap }),
                size,
            }),
        })
    }

    /// Reads the entry for `relative` offset, or the last entry for
    /// [`LAST_ENTRY`].
    ///
    /// Returns `(relative_offset, store_position)`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexEntryMissing`] if the index is empty or
    /// no entry has been written for `relative`.
    pub fn read(&self, relative: i64) -> StorageResult<(u32, u64)> {
        let state = self.state.lock();
        let mapping = state.mapping.as_ref().ok_or(StorageError::Closed)?;
        let entries = state.size / ENTRY_WIDTH;

        let missing = StorageError::IndexEntryMissing {
            entry: relative,
            entries,
        };

        let entry = match relative {
            LAST_ENTRY if entries > 0 => entries - 1,
            r if r >= 0 && (r as u64) < entries => r as u64,
            _ => return Err(missing),
        };

        let start = (entry * ENTRY_WIDTH) as usize;
        Ok(decode_entry(
            &mapping.mmap[start..start + ENTRY_WIDTH as usize],
        ))
    }

    /// Reads the last written entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexEntryMissing`] if the index is empty.
    pub fn last_entry(&self) -> StorageResult<(u32, u64)> {
        self.read(LAST_ENTRY)
    }

    /// Appends an entry mapping `offset` to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexFull`] if the mapped region has no room
    /// for another entry. This is the signal that triggers segment rotation.
    pub fn write(&self, offset: u32, position: u64) -> StorageResult<()> {
        let mut state = self.state.lock();
        let size = state.size;
        let mapping = state.mapping.as_mut().ok_or(StorageError::Closed)?;

        if (mapping.mmap.len() as u64) < size + ENTRY_WIDTH {
            return Err(StorageError::IndexFull {
                capacity: self.capacity,
            });
        }

        let start = size as usize;
        mapping.mmap[start..start + ENTRY_WIDTH as usize]
            .copy_from_slice(&encode_entry(offset, position));
        state.size += ENTRY_WIDTH;

        Ok(())
    }

    /// Drops every entry past the first `entries`.
    ///
    /// Only used while recovering a segment whose store is shorter than its
    /// index claims; live indexes are never rewound.
    pub fn discard_after(&self, entries: u64) {
        let mut state = self.state.lock();
        state.size = state.size.min(entries * ENTRY_WIDTH);
    }

    /// Returns the number of valid entries.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.state.lock().size / ENTRY_WIDTH
    }

    /// Returns the number of valid bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.state.lock().size
    }

    /// Returns how many entries the mapped region can hold.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns true if no further entry fits.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries() >= self.capacity
    }

    /// Flushes the mapped region to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is closed or the flush fails.
    pub fn sync(&self) -> StorageResult<()> {
        let state = self.state.lock();
        let mapping = state.mapping.as_ref().ok_or(StorageError::Closed)?;
        mapping.mmap.flush()?;
        mapping.file.sync_all()?;
        Ok(())
    }

    /// Syncs the mapping, unmaps it and truncates the file to the written
    /// entries.
    ///
    /// Closing an already closed index is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync or truncate fails.
    pub fn close(&self) -> StorageResult<()> {
        let mut state = self.state.lock();
        let Some(Mapping { file, mmap }) = state.mapping.take() else {
            return Ok(());
        };

        mmap.flush()?;
        file.sync_all()?;
        drop(mmap);

        file.set_len(state.size)?;
        file.sync_all()?;
        Ok(())
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
