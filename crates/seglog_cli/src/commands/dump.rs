//! Dump command implementation.
//!
//! Walks the raw frame stream of the log: every store file, oldest segment
//! first, one `| length (8) | payload |` frame at a time.

use seglog_core::Log;
use seglog_storage::layout::{decode_len, LEN_WIDTH};
use serde::Serialize;
use std::io::{self, Read};
use tracing::warn;

/// Frame representation for output.
#[derive(Debug, Serialize)]
pub struct FrameInfo {
    /// Frame number in the stream.
    pub frame: usize,
    /// Byte position of the frame in the concatenated stream.
    pub position: u64,
    /// Payload length from the frame prefix.
    pub length: u64,
}

/// Runs the dump command.
pub fn run(
    log: &Log,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let frames = read_frames(log.reader()?, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&frames)?);
        }
        _ => {
            for frame in &frames {
                println!(
                    "#{:<8} pos={:<12} len={}",
                    frame.frame, frame.position, frame.length
                );
            }
            println!("{} frames", frames.len());
        }
    }

    Ok(())
}

fn read_frames<R: Read>(mut reader: R, limit: Option<usize>) -> io::Result<Vec<FrameInfo>> {
    let max_frames = limit.unwrap_or(usize::MAX);
    let mut frames = Vec::new();
    let mut position = 0u64;

    while frames.len() < max_frames {
        let mut prefix = [0u8; LEN_WIDTH as usize];
        match reader.read_exact(&mut prefix) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }

        let length = decode_len(prefix);
        let skipped = io::copy(&mut (&mut reader).take(length), &mut io::sink())?;
        if skipped < length {
            warn!(position, length, "stream ends inside a frame");
            break;
        }

        frames.push(FrameInfo {
            frame: frames.len(),
            position,
            length,
        });
        position += LEN_WIDTH + length;
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seglog_core::{Config, Record};
    use seglog_storage::layout::encode_len;
    use tempfile::tempdir;

    #[test]
    fn frames_from_bytes() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&encode_len(3));
        bytes.extend_from_slice(b"abc");
        bytes.extend_from_slice(&encode_len(0));

        let frames = read_frames(bytes.as_slice(), None).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].length, 3);
        assert_eq!(frames[1].position, 11);
        assert_eq!(frames[1].length, 0);
    }

    #[test]
    fn truncated_frame_stops_walk() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&encode_len(10));
        bytes.extend_from_slice(b"short");

        assert!(read_frames(bytes.as_slice(), None).unwrap().is_empty());
    }

    #[test]
    fn frames_span_segments() {
        let dir = tempdir().unwrap();
        let log = Log::open(dir.path(), Config::new().max_index_bytes(24)).unwrap();
        for _ in 0..5 {
            log.append(Record::new(b"payload".to_vec())).unwrap();
        }

        let frames = read_frames(log.reader().unwrap(), None).unwrap();
        assert_eq!(frames.len(), 5);

        let limited = read_frames(log.reader().unwrap(), Some(2)).unwrap();
        assert_eq!(limited.len(), 2);
    }
}
