//! The log: an ordered set of segments presented as one offset sequence.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::reader::LogReader;
use crate::segment::{Segment, SegmentInfo, INDEX_EXTENSION, STORE_EXTENSION};
use parking_lot::RwLock;
use seglog_codec::Record;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A segmented, append-only commit log stored in one directory.
///
/// New records go to the active segment, which is always the last one.
/// Once it reaches a size limit a new segment starting at the next offset
/// takes over.
///
/// # Thread Safety
///
/// A read/write lock guards the segment list. `append`, `truncate`,
/// `close`, `remove` and `reset` take it exclusively; reads and offset
/// queries share it.
///
/// # Example
///
/// ```no_run
/// use seglog_core::{Config, Log, Record};
///
/// let log = Log::open("data/log", Config::default()).unwrap();
/// let offset = log.append(Record::new(b"hello world".to_vec())).unwrap();
/// assert_eq!(log.read(offset).unwrap().value, b"hello world");
/// log.close().unwrap();
/// ```
pub struct Log {
    dir: PathBuf,
    config: Config,
    /// Ascending by base offset; the last one is active.
    segments: RwLock<Vec<Segment>>,
}

impl Log {
    /// Opens the log in `dir`, recovering any segments already there.
    ///
    /// The directory is created if missing. An empty directory gets one
    /// segment at `config.initial_offset`. Zero size limits take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the directory
    /// cannot be read or a segment cannot be opened.
    pub fn open(dir: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let config = config.normalized();
        config.validate()?;

        let dir = dir.as_ref().to_path_buf();
        let segments = setup(&dir, config)?;

        Ok(Self {
            dir,
            config,
            segments: RwLock::new(segments),
        })
    }

    /// Appends `record` and returns the offset assigned to it.
    ///
    /// Rotation happens after the write, so the segment written to may end
    /// up past its limit by one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or a new segment cannot be
    /// created.
    pub fn append(&self, mut record: Record) -> CoreResult<u64> {
        let mut segments = self.segments.write();

        // Covers a rotation that failed on the previous append.
        self.rotate_if_maxed(&mut segments)?;

        let active = segments.last_mut().ok_or(CoreError::LogClosed)?;
        let offset = active.append(&mut record)?;

        self.rotate_if_maxed(&mut segments)?;
        Ok(offset)
    }

    /// Reads the record at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OffsetOutOfRange`] if no segment holds `offset`.
    pub fn read(&self, offset: u64) -> CoreResult<Record> {
        let segments = self.segments.read();
        let (first, last) = bounds(&segments)?;

        let segment = segments
            .iter()
            .find(|s| s.base_offset() <= offset && offset < s.next_offset())
            .ok_or(CoreError::OffsetOutOfRange {
                offset,
                lowest: first.base_offset(),
                next: last.next_offset(),
            })?;

        segment.read(offset)
    }

    /// Returns the lowest offset the log holds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LogClosed`] once the log has been removed.
    pub fn lowest_offset(&self) -> CoreResult<u64> {
        let segments = self.segments.read();
        Ok(bounds(&segments)?.0.base_offset())
    }

    /// Returns the highest offset the log holds, or `None` if it holds no
    /// records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LogClosed`] once the log has been removed.
    pub fn highest_offset(&self) -> CoreResult<Option<u64>> {
        let segments = self.segments.read();
        let (first, last) = bounds(&segments)?;
        let next = last.next_offset();

        Ok((next > first.base_offset()).then(|| next - 1))
    }

    /// Returns the offset the next append will be assigned.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LogClosed`] once the log has been removed.
    pub fn next_offset(&self) -> CoreResult<u64> {
        let segments = self.segments.read();
        Ok(bounds(&segments)?.1.next_offset())
    }

    /// Deletes every segment whose records all lie at or below `lowest`.
    ///
    /// Segments holding any offset above `lowest` are kept untouched. If
    /// every segment goes, a fresh one is started at the old next offset so
    /// offsets keep increasing.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment's files cannot be deleted.
    pub fn truncate(&self, lowest: u64) -> CoreResult<()> {
        let mut segments = self.segments.write();
        let bound = lowest.saturating_add(1);

        while segments.first().is_some_and(|s| s.next_offset() <= bound) {
            let segment = segments.remove(0);
            let next = segment.next_offset();
            let removed = segment.remove();

            if segments.is_empty() {
                segments.push(Segment::open(&self.dir, next, self.config)?);
            }
            removed?;
        }

        debug!(lowest, segments = segments.len(), "truncated log");
        Ok(())
    }

    /// Returns a raw byte stream over every segment's store, in order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LogClosed`] once the log has been removed.
    pub fn reader(&self) -> CoreResult<LogReader> {
        let segments = self.segments.read();
        bounds(&segments)?;

        let stores = segments.iter().map(|s| Arc::clone(s.store())).collect();
        Ok(LogReader::new(stores))
    }

    /// Returns a summary of every segment, oldest first.
    #[must_use]
    pub fn segments(&self) -> Vec<SegmentInfo> {
        self.segments.read().iter().map(Segment::info).collect()
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Flushes and closes every segment.
    ///
    /// Index files are truncated to their written entries, leaving the
    /// directory ready to be reopened.
    ///
    /// # Errors
    ///
    /// Returns the first error hit while closing a segment.
    pub fn close(&self) -> CoreResult<()> {
        let segments = self.segments.write();
        close_all(&segments)
    }

    /// Closes the log and deletes its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if closing fails or the directory cannot be deleted.
    pub fn remove(&self) -> CoreResult<()> {
        let mut segments = self.segments.write();
        self.remove_locked(&mut segments)
    }

    /// Removes all data and starts over with one empty segment at the
    /// configured initial offset.
    ///
    /// # Errors
    ///
    /// Returns an error if removal or setup fails.
    pub fn reset(&self) -> CoreResult<()> {
        let mut segments = self.segments.write();
        self.remove_locked(&mut segments)?;
        *segments = setup(&self.dir, self.config)?;
        Ok(())
    }

    /// Returns the log directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn remove_locked(&self, segments: &mut Vec<Segment>) -> CoreResult<()> {
        close_all(segments)?;
        segments.clear();

        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        info!(dir = %self.dir.display(), "removed log");
        Ok(())
    }

    fn rotate_if_maxed(&self, segments: &mut Vec<Segment>) -> CoreResult<()> {
        let Some(active) = segments.last() else {
            return Ok(());
        };
        if !active.is_maxed() {
            return Ok(());
        }

        let base_offset = active.next_offset();
        let segment = Segment::open(&self.dir, base_offset, self.config)?;
        segments.push(segment);

        debug!(base_offset, segments = segments.len(), "rotated to new segment");
        Ok(())
    }
}

impl std::fmt::Debug for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Log")
            .field("dir", &self.dir)
            .field("config", &self.config)
            .field("segments", &self.segment_count())
            .finish_non_exhaustive()
    }
}

fn bounds(segments: &[Segment]) -> CoreResult<(&Segment, &Segment)> {
    match (segments.first(), segments.last()) {
        (Some(first), Some(last)) => Ok((first, last)),
        _ => Err(CoreError::LogClosed),
    }
}

fn close_all(segments: &[Segment]) -> CoreResult<()> {
    for segment in segments {
        segment.close()?;
    }
    Ok(())
}

/// Extracts the base offset from a segment file name such as `16.store`.
fn parse_base_offset(path: &Path) -> Option<u64> {
    let extension = path.extension()?.to_str()?;
    if extension != STORE_EXTENSION && extension != INDEX_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

/// Opens every segment found in `dir`, or a single fresh one if there are
/// none.
fn setup(dir: &Path, config: Config) -> CoreResult<Vec<Segment>> {
    fs::create_dir_all(dir)?;

    // A store and its index share a base offset; the set keeps one of each.
    let mut base_offsets = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        match parse_base_offset(&path) {
            Some(base_offset) => {
                base_offsets.insert(base_offset);
            }
            None => warn!(path = %path.display(), "skipping file that is not a segment file"),
        }
    }

    let mut segments = base_offsets
        .into_iter()
        .map(|base_offset| Segment::open(dir, base_offset, config))
        .collect::<CoreResult<Vec<_>>>()?;

    if segments.is_empty() {
        segments.push(Segment::open(dir, config.initial_offset, config)?);
    } else if let Some(active) = segments.last().filter(|s| s.is_maxed()) {
        let base_offset = active.next_offset();
        segments.push(Segment::open(dir, base_offset, config)?);
    }

    info!(
        dir = %dir.display(),
        segments = segments.len(),
        lowest = segments[0].base_offset(),
        next = segments[segments.len() - 1].next_offset(),
        "opened log"
    );

    Ok(segments)
}
