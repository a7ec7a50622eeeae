//! Follows the chat log directory. A chat log created while running ends the
//! current tracking session and becomes the active file.

use crate::app_state::AppState;
use crate::commands;
use crate::directory_index::{LogFileIndex, is_chat_log};
use crate::error::{ReaderError, WatcherError};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;

/// Directory changes that matter to tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDirEvent {
    /// A chat log appeared (created, or renamed into the directory)
    NewLog(PathBuf),
    /// A chat log went away
    LogRemoved(PathBuf),
}

/// Reduce a raw notify event to the chat log changes it carries.
pub fn classify_event(event: &Event) -> Vec<LogDirEvent> {
    let to_event: fn(PathBuf) -> LogDirEvent = match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            LogDirEvent::NewLog
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            LogDirEvent::LogRemoved
        }
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|path| is_chat_log(path))
        .map(|path| to_event(path.clone()))
        .collect()
}

struct ChatLogWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
}

impl ChatLogWatcher {
    fn new(dir: &Path) -> Result<Self, WatcherError> {
        let (tx, rx) = mpsc::channel(100);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.blocking_send(res);
            },
            Config::default(),
        )
        .map_err(WatcherError::InitWatcher)?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatcherError::WatchPath {
                path: dir.to_path_buf(),
                source,
            })?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }
}

/// Apply one directory change to the application state.
///
/// A new log stops the running session (its counters are removed and any runs
/// are dropped without an announcement), then the new file is replayed and tailed.
pub async fn apply_log_event(
    event: LogDirEvent,
    state: Arc<RwLock<AppState>>,
) -> Result<(), ReaderError> {
    match event {
        LogDirEvent::NewLog(path) => {
            let dropped_runs = {
                let mut s = state.write().await;
                if let Some(index) = &mut s.file_index {
                    index.add_file(&path);
                }
                // Editors and some platforms report the same creation twice
                if s.active_file.as_deref() == Some(path.as_path()) {
                    return Ok(());
                }
                s.tracker.active_runs().len()
            };

            tracing::info!(
                path = %path.display(),
                dropped_runs,
                "New chat log detected, switching session"
            );
            if dropped_runs > 0 {
                println!("new chat log, {dropped_runs} run(s) in progress were dropped");
            }
            commands::parse_file(&path.to_string_lossy(), state).await
        }
        LogDirEvent::LogRemoved(path) => {
            let mut s = state.write().await;
            if let Some(index) = &mut s.file_index {
                index.remove_file(&path);
            }
            if s.active_file.as_deref() == Some(path.as_path()) {
                tracing::warn!(path = %path.display(), "Active chat log was removed");
            }
            Ok(())
        }
    }
}

async fn run_watcher(dir: PathBuf, state: Arc<RwLock<AppState>>) {
    if !dir.exists() {
        tracing::warn!(dir = %dir.display(), "Chat log directory does not exist");
        return;
    }

    let mut watcher = match ChatLogWatcher::new(&dir) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start directory watcher");
            return;
        }
    };
    tracing::info!(dir = %dir.display(), "Watching chat log directory");

    while let Some(result) = watcher.rx.recv().await {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Watch error");
                continue;
            }
        };
        for change in classify_event(&event) {
            if let Err(e) = apply_log_event(change, Arc::clone(&state)).await {
                tracing::error!(error = %e, "Failed to switch chat log");
            }
        }
    }
}

/// Index the log directory, load the newest chat log and spawn the watcher task.
pub async fn init_watcher(state: Arc<RwLock<AppState>>) -> JoinHandle<()> {
    let dir = PathBuf::from(&state.read().await.config.log_directory);

    match LogFileIndex::build_index(&dir) {
        Ok(index) => {
            let newest = index.newest_file().map(|f| f.path.clone());
            println!("Indexed {} chat logs", index.len());
            state.write().await.file_index = Some(index);

            if let Some(path) = newest {
                let path = path.to_string_lossy().to_string();
                if let Err(e) = commands::parse_file(&path, Arc::clone(&state)).await {
                    tracing::error!(error = %e, "Failed to load newest chat log");
                }
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to build file index"),
    }

    tokio::spawn(run_watcher(dir, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_models::ChatChannel;
    use crate::config::AppConfig;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::fs;

    const OLD_LOG: &str = "chat_2025-03-14_20_15_00_000000.txt";
    const NEW_LOG: &str = "chat_2025-03-14_22_40_00_000000.txt";

    #[test]
    fn test_classify_create_and_remove() {
        let dir = Path::new("/logs");
        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(dir.join(NEW_LOG))
            .add_path(dir.join("notes.txt"));
        assert_eq!(
            classify_event(&created),
            vec![LogDirEvent::NewLog(dir.join(NEW_LOG))]
        );

        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(dir.join(OLD_LOG));
        assert_eq!(
            classify_event(&removed),
            vec![LogDirEvent::LogRemoved(dir.join(OLD_LOG))]
        );
    }

    #[test]
    fn test_classify_rename_and_ignored_kinds() {
        let path = Path::new("/logs").join(NEW_LOG);
        let renamed_in =
            Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To))).add_path(path.clone());
        assert_eq!(
            classify_event(&renamed_in),
            vec![LogDirEvent::NewLog(path.clone())]
        );

        // Writes to an existing log are the tail's job
        let written =
            Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path);
        assert!(classify_event(&written).is_empty());
    }

    #[tokio::test]
    async fn test_new_log_ends_session_and_switches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(OLD_LOG),
            "[20:15:01] clan alice: \n[20:15:02] clan bob: \n[20:15:03] clan carol: \n",
        )
        .unwrap();

        let mut app = AppState::with_config(AppConfig {
            log_directory: dir.path().to_string_lossy().to_string(),
            ..Default::default()
        });
        app.host.muted = true;
        app.file_index = Some(LogFileIndex::build_index(dir.path()).unwrap());
        let state = Arc::new(RwLock::new(app));

        commands::parse_file(OLD_LOG, Arc::clone(&state)).await.unwrap();
        assert!(state.read().await.host.board.get(ChatChannel::ClanChat).is_some());

        let new_path = dir.path().join(NEW_LOG);
        fs::write(&new_path, "[22:40:01] public dave: \n").unwrap();
        apply_log_event(LogDirEvent::NewLog(new_path.clone()), Arc::clone(&state))
            .await
            .unwrap();

        let mut s = state.write().await;
        assert_eq!(s.active_file.as_deref(), Some(new_path.as_path()));
        assert!(s.session_active);
        assert_eq!(s.tracker.run_count(ChatChannel::ClanChat), 0);
        assert!(s.host.board.get(ChatChannel::ClanChat).is_none());
        assert_eq!(s.tracker.run_count(ChatChannel::Public), 1);
        assert_eq!(s.file_index.as_ref().unwrap().len(), 2);
        assert_eq!(
            s.file_index.as_ref().unwrap().newest_file().unwrap().path,
            new_path
        );
        if let Some(task) = s.log_tail_task.take() {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_repeated_create_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OLD_LOG);
        fs::write(&path, "[20:15:01] public alice: \n[20:15:02] public bob: \n").unwrap();

        let mut app = AppState::with_config(AppConfig {
            log_directory: dir.path().to_string_lossy().to_string(),
            ..Default::default()
        });
        app.host.muted = true;
        let state = Arc::new(RwLock::new(app));
        commands::parse_file(OLD_LOG, Arc::clone(&state)).await.unwrap();

        apply_log_event(LogDirEvent::NewLog(path), Arc::clone(&state))
            .await
            .unwrap();

        let mut s = state.write().await;
        assert_eq!(s.tracker.run_count(ChatChannel::Public), 2);
        assert!(s.log_tail_task.is_some());
        if let Some(task) = s.log_tail_task.take() {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_removed_log_leaves_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OLD_LOG);
        fs::write(&path, "").unwrap();

        let mut app = AppState::with_config(AppConfig::default());
        app.file_index = Some(LogFileIndex::build_index(dir.path()).unwrap());
        let state = Arc::new(RwLock::new(app));
        assert_eq!(state.read().await.file_index.as_ref().unwrap().len(), 1);

        apply_log_event(LogDirEvent::LogRemoved(path), Arc::clone(&state))
            .await
            .unwrap();
        assert!(state.read().await.file_index.as_ref().unwrap().is_empty());
    }
}
