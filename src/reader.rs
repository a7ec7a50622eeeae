use crate::app_state::AppState;
use crate::chat_models::ChatMessage;
use crate::error::ReaderError;
use crate::parser::parse_line;
use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::RwLock;
use tokio::time::{Duration, sleep};

const TAIL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of parsing a whole chat log.
#[derive(Debug, Default)]
pub struct ParsedLog {
    /// Messages in file order
    pub messages: Vec<ChatMessage>,
    /// Byte offset where tailing should resume
    pub end_pos: u64,
    /// Number of lines read, blank and malformed lines included
    pub line_count: u64,
}

/// Parse a whole chat log.
pub fn read_log_file<P: AsRef<Path>>(path: P) -> Result<ParsedLog, ReaderError> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|source| ReaderError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if file.metadata().map(|m| m.len() == 0).unwrap_or(false) {
        // Empty files cannot be mapped on every platform
        return Ok(ParsedLog::default());
    }

    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| ReaderError::Map {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = mmap.as_ref();

    // Blank lines keep their range so line numbers match the file
    let mut line_ranges: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    for end in memchr_iter(b'\n', bytes) {
        line_ranges.push((start, end));
        start = end + 1;
    }
    if start < bytes.len() {
        line_ranges.push((start, bytes.len()));
    }

    let messages: Vec<ChatMessage> = line_ranges
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &(start, end))| {
            let line = String::from_utf8_lossy(&bytes[start..end]);
            parse_line(idx as u64 + 1, &line)
        })
        .collect();

    Ok(ParsedLog {
        messages,
        end_pos: bytes.len() as u64,
        line_count: line_ranges.len() as u64,
    })
}

pub struct Reader {
    path: PathBuf,
    state: Arc<RwLock<AppState>>,
}

impl Reader {
    pub fn from(path: PathBuf, state: Arc<RwLock<AppState>>) -> Self {
        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_log_file(&self) -> Result<ParsedLog, ReaderError> {
        read_log_file(&self.path)
    }

    /// Follow the file from the stored byte offset, feeding every new line to the tracker.
    pub async fn tail_log_file(&self) -> Result<(), ReaderError> {
        let file = File::open(&self.path)
            .await
            .map_err(|source| ReaderError::Open {
                path: self.path.clone(),
                source,
            })?;
        let mut reader = BufReader::new(file);
        let (mut pos, mut line_number) = {
            let s = self.state.read().await;
            (s.current_byte.unwrap_or(0), s.current_line)
        };

        reader
            .seek(SeekFrom::Start(pos))
            .await
            .map_err(|source| self.read_error(source))?;

        let mut buf: Vec<u8> = Vec::new();

        loop {
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|source| self.read_error(source))?;
            // Nothing new, or the writer has not finished the line yet
            if read == 0 || buf.last() != Some(&b'\n') {
                sleep(TAIL_POLL_INTERVAL).await;
                continue;
            }

            line_number += 1;
            pos += buf.len() as u64;
            let line = String::from_utf8_lossy(&buf);
            let mut s = self.state.write().await;
            s.current_byte = Some(pos);
            s.current_line = line_number;
            match parse_line(line_number, &line) {
                Some(message) => s.process_message(message),
                None => tracing::debug!(line_number, "Skipped unparseable chat line"),
            }
            drop(s);
            buf.clear();
        }
    }

    fn read_error(&self, source: std::io::Error) -> ReaderError {
        ReaderError::Read {
            path: self.path.clone(),
            source,
        }
    }
}
