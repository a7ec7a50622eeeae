use crate::error::WatcherError;
use hashbrown::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Iso8601;
use time::{Date, PrimitiveDateTime, Time};

const LOG_PREFIX: &str = "chat_";
const LOG_SUFFIX: &str = ".txt";

pub struct LogFileMetaData {
    pub path: PathBuf,
    pub filename: String,
    pub date: Date,
    pub created_at: PrimitiveDateTime,
    pub is_empty: bool,
}

impl LogFileMetaData {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.date, self.created_at.time())
    }
}

#[derive(Default)]
pub struct LogFileIndex {
    entries: HashMap<PathBuf, LogFileMetaData>,
}

impl LogFileIndex {
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    pub fn build_index(dir: &Path) -> Result<Self, WatcherError> {
        let mut index = Self::new();

        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "Chat log directory not found");
            return Ok(index);
        }

        let files = fs::read_dir(dir).map_err(|source| WatcherError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in files.filter_map(|e| e.ok()) {
            let path = entry.path();
            if is_chat_log(&path) {
                index.add_file(&path);
            }
        }
        Ok(index)
    }

    pub fn create_entry(path: &Path) -> Option<LogFileMetaData> {
        let filename = path.file_name()?.to_str()?.to_string();
        let (date, created_at) = parse_log_filename(&filename)?;
        let metadata = fs::metadata(path).ok()?;

        Some(LogFileMetaData {
            path: path.to_path_buf(),
            filename,
            date,
            created_at,
            is_empty: metadata.len() == 0,
        })
    }

    pub fn add_file(&mut self, path: &Path) -> Option<()> {
        let entry = Self::create_entry(path)?;
        self.entries.insert(entry.path.clone(), entry);
        Some(())
    }

    pub fn remove_file(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    // Accessor methods

    /// All entries, newest first
    pub fn entries(&self) -> Vec<&LogFileMetaData> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }

    pub fn newest_file(&self) -> Option<&LogFileMetaData> {
        self.entries.values().max_by_key(|e| e.created_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn is_chat_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(LOG_PREFIX) && n.ends_with(LOG_SUFFIX))
        .unwrap_or(false)
}

/// Parse `chat_YYYY-MM-DD_HH_MM_SS_micros.txt`
pub fn parse_log_filename(filename: &str) -> Option<(Date, PrimitiveDateTime)> {
    let stem = filename.strip_suffix(LOG_SUFFIX).unwrap_or(filename);
    let parts: Vec<&str> = stem.split('_').collect();

    if parts.len() != 6 || parts[0] != "chat" {
        tracing::debug!(filename, "Not a chat log file name");
        return None;
    }

    let date = Date::parse(parts[1], &Iso8601::DATE).ok()?;
    let hour: u8 = parts[2].parse().ok()?;
    let min: u8 = parts[3].parse().ok()?;
    let sec: u8 = parts[4].parse().ok()?;
    let microsec: u32 = parts[5].parse().ok()?;

    let time = Time::from_hms_micro(hour, min, sec, microsec).ok()?;
    Some((date, PrimitiveDateTime::new(date, time)))
}
