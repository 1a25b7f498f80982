//! Raw byte stream over every store in the log.

use seglog_storage::{StorageError, Store};
use std::io::{self, Read};
use std::sync::Arc;

/// Reads the concatenated store files of a log, oldest segment first.
///
/// The stream is frame-level: it yields `| length (8) | payload |` frames
/// exactly as stored, not decoded records. Each store is read from its
/// start; reaching its end moves on to the next one.
#[derive(Debug)]
pub struct LogReader {
    stores: Vec<Arc<Store>>,
    current: usize,
    position: u64,
}

impl LogReader {
    pub(crate) fn new(stores: Vec<Arc<Store>>) -> Self {
        Self {
            stores,
            current: 0,
            position: 0,
        }
    }
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while let Some(store) = self.stores.get(self.current) {
            match store.read_at(buf, self.position) {
                Ok(n) => {
                    self.position += n as u64;
                    return Ok(n);
                }
                Err(e) if e.is_end_of_data() => {
                    self.current += 1;
                    self.position = 0;
                }
                Err(StorageError::Io(e)) => return Err(e),
                Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e)),
            }
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seglog_storage::LEN_WIDTH;
    use tempfile::tempdir;

    #[test]
    fn concatenates_stores_in_order() {
        let dir = tempdir().unwrap();
        let first = Store::open(&dir.path().join("0.store")).unwrap();
        let second = Store::open(&dir.path().join("2.store")).unwrap();
        first.append(b"ab").unwrap();
        first.append(b"cd").unwrap();
        second.append(b"ef").unwrap();

        let mut reader = LogReader::new(vec![Arc::new(first), Arc::new(second)]);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).unwrap();

        assert_eq!(bytes.len() as u64, 3 * (LEN_WIDTH + 2));
        assert_eq!(&bytes[8..10], b"ab");
        assert_eq!(&bytes[18..20], b"cd");
        assert_eq!(&bytes[28..30], b"ef");
    }

    #[test]
    fn skips_empty_stores() {
        let dir = tempdir().unwrap();
        let empty = Store::open(&dir.path().join("0.store")).unwrap();
        let full = Store::open(&dir.path().join("1.store")).unwrap();
        full.append(b"x").unwrap();

        let mut reader = LogReader::new(vec![Arc::new(empty), Arc::new(full)]);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes.len() as u64, LEN_WIDTH + 1);
    }

    #[test]
    fn no_stores_is_empty_stream() {
        let mut reader = LogReader::new(Vec::new());
        let mut bytes = Vec::new();
        assert_eq!(reader.read_to_end(&mut bytes).unwrap(), 0);
    }
}
