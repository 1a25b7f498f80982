//! Append-only store of length-prefixed frames.

use crate::error::{StorageError, StorageResult};
use crate::layout::{decode_len, encode_len, LEN_WIDTH};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// An append-only file of length-prefixed payloads.
///
/// Appends go through a buffered writer to cut down on write syscalls.
/// Every read flushes the buffer first, so a frame is readable as soon as
/// [`Store::append`] returns.
///
/// # Thread Safety
///
/// All operations serialize on one internal mutex; an append and a read on
/// the same store never run concurrently.
///
/// # Example
///
/// ```no_run
/// use seglog_storage::Store;
/// use std::path::Path;
///
/// let store = Store::open(Path::new("0.store")).unwrap();
/// let (_, position) = store.append(b"hello world").unwrap();
/// assert_eq!(store.read(position).unwrap(), b"hello world");
/// ```
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    state: Mutex<StoreState>,
}

#[derive(Debug)]
struct StoreState {
    /// `None` once the store has been closed.
    writer: Option<BufWriter<File>>,
    /// Logical size, including bytes still sitting in the buffer.
    size: u64,
}

impl StoreState {
    /// Flushes the write buffer and returns the underlying file for reading.
    fn flushed_file(&mut self) -> StorageResult<&mut File> {
        let writer = self.writer.as_mut().ok_or(StorageError::Closed)?;
        writer.flush()?;
        Ok(writer.get_mut())
    }
}

impl Store {
    /// Opens or creates a store file at the given path.
    ///
    /// An existing file is reopened and new frames are appended after its
    /// current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        // Append mode keeps writes at the end even after reads move the cursor.
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(StoreState {
                writer: Some(BufWriter::new(file)),
                size,
            }),
        })
    }

    /// Appends one frame holding `payload`.
    ///
    /// Returns `(bytes_written, position)`: the total frame size (length
    /// prefix plus payload) and the position the frame starts at.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or an I/O error occurs.
    pub fn append(&self, payload: &[u8]) -> StorageResult<(u64, u64)> {
        let mut state = self.state.lock();
        let position = state.size;
        let writer = state.writer.as_mut().ok_or(StorageError::Closed)?;

        writer.write_all(&encode_len(payload.len() as u64))?;
        writer.write_all(payload)?;

        let written = LEN_WIDTH + payload.len() as u64;
        state.size += written;

        Ok((written, position))
    }

    /// Reads the payload of the frame starting at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`] if the length prefix or the
    /// payload it announces extends beyond the end of the store.
    pub fn read(&self, position: u64) -> StorageResult<Vec<u8>> {
        let mut state = self.state.lock();
        let size = state.size;
        let file = state.flushed_file()?;

        if position.saturating_add(LEN_WIDTH) > size {
            return Err(StorageError::ReadPastEnd {
                position,
                len: LEN_WIDTH,
                size,
            });
        }

        let mut prefix = [0u8; LEN_WIDTH as usize];
        file.seek(SeekFrom::Start(position))?;
        file.read_exact(&mut prefix)?;

        let len = decode_len(prefix);
        let start = position + LEN_WIDTH;
        if start.saturating_add(len) > size {
            return Err(StorageError::ReadPastEnd {
                position: start,
                len,
                size,
            });
        }

        let mut payload = vec![0u8; len as usize];
        file.read_exact(&mut payload)?;

        Ok(payload)
    }

    /// Reads raw bytes starting at `offset` into `buf`.
    ///
    /// This is not frame-aware. Returns the number of bytes read, which is
    /// less than `buf.len()` only when the end of the store is reached.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`] if `offset` is at or beyond the
    /// end of the store and `buf` is non-empty.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> StorageResult<usize> {
        let mut state = self.state.lock();
        let size = state.size;
        let file = state.flushed_file()?;

        if buf.is_empty() {
            return Ok(0);
        }
        if offset >= size {
            return Err(StorageError::ReadPastEnd {
                position: offset,
                len: buf.len() as u64,
                size,
            });
        }

        let available = usize::try_from(size - offset).unwrap_or(usize::MAX);
        let n = buf.len().min(available);

        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf[..n])?;

        Ok(n)
    }

    /// Returns the current size in bytes, which is the next append position.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.state.lock().size
    }

    /// Flushes buffered frames and syncs the file to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the sync fails.
    pub fn sync(&self) -> StorageResult<()> {
        let mut state = self.state.lock();
        let file = state.flushed_file()?;
        file.sync_all()?;
        Ok(())
    }

    /// Flushes buffered frames and closes the file.
    ///
    /// Closing an already closed store is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush or sync fails.
    pub fn close(&self) -> StorageResult<()> {
        let mut state = self.state.lock();
        let Some(writer) = state.writer.take() else {
            return Ok(());
        };

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }

    /// Returns true once [`Store::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().writer.is_none()
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    const WRITE: &[u8] = b"hello world";
    const WIDTH: u64 = WRITE.len() as u64 + LEN_WIDTH;

    #[test]
    fn store_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.store");

        let store = Store::open(&path).unwrap();
        assert_eq!(store.size(), 0);
        assert!(path.exists());
        assert_eq!(store.path(), path);
    }

    #[test]
    fn store_append_and_read() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("0.store")).unwrap();

        for i in 1..4u64 {
            let (written, position) = store.append(WRITE).unwrap();
            assert_eq!(written, WIDTH);
            assert_eq!(position + written, WIDTH * i);
        }

        let mut position = 0;
        for _ in 1..4 {
            let read = store.read(position).unwrap();
            assert_eq!(read, WRITE);
            position += WIDTH;
        }
    }

    #[test]
    fn store_read_at_frame_layout() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("0.store")).unwrap();
        store.append(WRITE).unwrap();
        store.append(WRITE).unwrap();

        let mut offset = 0;
        for _ in 0..2 {
            let mut prefix = [0u8; LEN_WIDTH as usize];
            let n = store.read_at(&mut prefix, offset).unwrap();
            assert_eq!(n as u64, LEN_WIDTH);
            offset += n as u64;

            let len = decode_len(prefix);
            let mut payload = vec![0u8; len as usize];
            let n = store.read_at(&mut payload, offset).unwrap();
            assert_eq!(payload, WRITE);
            offset += n as u64;
        }
    }

    #[test]
    fn store_read_at_short_read_then_end() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("0.store")).unwrap();
        store.append(b"abc").unwrap();

        let mut buf = [0u8; 64];
        let n = store.read_at(&mut buf, 0).unwrap();
        assert_eq!(n as u64, LEN_WIDTH + 3);
        assert_eq!(&buf[8..11], b"abc");

        let result = store.read_at(&mut buf, n as u64);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn store_read_past_end_fails() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("0.store")).unwrap();
        store.append(WRITE).unwrap();

        let err = store.read(WIDTH).unwrap_err();
        assert!(err.is_end_of_data());

        // Position inside the frame: the decoded "length" runs off the end.
        let err = store.read(4).unwrap_err();
        assert!(matches!(err, StorageError::ReadPastEnd { .. }));
    }

    #[test]
    fn store_append_after_read_stays_at_end() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("0.store")).unwrap();

        let (_, first) = store.append(b"first").unwrap();
        assert_eq!(store.read(first).unwrap(), b"first");

        let (_, second) = store.append(b"second").unwrap();
        assert_eq!(second, LEN_WIDTH + 5);
        assert_eq!(store.read(second).unwrap(), b"second");
        assert_eq!(store.read(first).unwrap(), b"first");
    }

    #[test]
    fn store_empty_payload() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("0.store")).unwrap();

        let (written, position) = store.append(b"").unwrap();
        assert_eq!(written, LEN_WIDTH);
        assert!(store.read(position).unwrap().is_empty());
    }

    #[test]
    fn store_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.store");

        {
            let store = Store::open(&path).unwrap();
            store.append(WRITE).unwrap();
            store.close().unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.size(), WIDTH);
        assert_eq!(store.read(0).unwrap(), WRITE);

        let (_, position) = store.append(b"more").unwrap();
        assert_eq!(position, WIDTH);
    }

    #[test]
    fn store_close_flushes_buffer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.store");

        let store = Store::open(&path).unwrap();
        store.append(WRITE).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

        store.close().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), WIDTH);
    }

    #[test]
    fn store_closed_rejects_operations() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("0.store")).unwrap();
        store.append(WRITE).unwrap();
        store.close().unwrap();

        assert!(store.is_closed());
        assert!(matches!(store.append(WRITE), Err(StorageError::Closed)));
        assert!(matches!(store.read(0), Err(StorageError::Closed)));
        assert!(matches!(store.sync(), Err(StorageError::Closed)));

        // Closing twice is fine.
        store.close().unwrap();
    }

    proptest! {
        #[test]
        fn store_round_trip(
            payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 1..32),
        ) {
            let dir = tempdir().unwrap();
            let store = Store::open(&dir.path().join("0.store")).unwrap();

            let positions: Vec<u64> = payloads
                .iter()
                .map(|p| store.append(p).unwrap().1)
                .collect();

            for (payload, position) in payloads.iter().zip(positions) {
                prop_assert_eq!(&store.read(position).unwrap(), payload);
            }
        }
    }
}
