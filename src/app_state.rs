use crate::chat_models::ChatMessage;
use crate::config::AppConfig;
use crate::directory_index::{LogFileIndex, parse_log_filename};
use crate::host::{ActionSink, ConsoleHost};
use crate::tracker::RunTracker;
use std::path::{Path, PathBuf};
use time::Date;

pub struct AppState {
    pub current_byte: Option<u64>,
    /// Last line number handed to the tracker from the active file
    pub current_line: u64,
    pub config: AppConfig,
    pub tracker: RunTracker,
    pub host: ConsoleHost,
    pub active_file: Option<PathBuf>,
    pub chat_session_date: Option<Date>,
    pub session_active: bool,
    pub log_tail_task: Option<tokio::task::JoinHandle<()>>,
    pub file_index: Option<LogFileIndex>,
    pub watcher_task: Option<tokio::task::JoinHandle<()>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(AppConfig::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(AppConfig::load())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            current_byte: None,
            current_line: 0,
            config,
            tracker: RunTracker::new(),
            host: ConsoleHost::new(),
            active_file: None,
            chat_session_date: None,
            session_active: false,
            log_tail_task: None,
            file_index: None,
            watcher_task: None,
        }
    }

    /// Point the state at a chat log. Relative paths resolve against the log directory.
    pub fn set_active_file(&mut self, path: &str) -> PathBuf {
        let given_path = Path::new(path);
        let resolved = if given_path.is_relative() {
            Path::new(&self.config.log_directory).join(given_path)
        } else {
            given_path.to_path_buf()
        };

        self.chat_session_date = resolved
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(parse_log_filename)
            .map(|(date, _)| date);
        self.active_file = Some(resolved.clone());
        self.current_byte = None;
        self.current_line = 0;
        resolved
    }

    pub fn start_session(&mut self) {
        let actions = self.tracker.on_start();
        self.host.apply_all(&actions);
        self.session_active = true;
        tracing::info!(file = ?self.active_file, "Tracking session started");
    }

    pub fn stop_session(&mut self) {
        let actions = self.tracker.on_stop();
        self.host.apply_all(&actions);
        self.session_active = false;
        tracing::info!("Tracking session stopped");
    }

    /// Run one message through the tracker and render the resulting actions.
    /// Messages arriving while no session is active are dropped.
    pub fn process_message(&mut self, message: ChatMessage) {
        if !self.session_active {
            return;
        }
        let actions = self.tracker.handle_message(&message, &self.config.tracker);
        self.host.apply_all(&actions);
    }

    pub fn process_messages(&mut self, messages: Vec<ChatMessage>) {
        for message in messages {
            self.process_message(message);
        }
    }

    /// Replay existing messages without printing anything.
    pub fn replay_messages(&mut self, messages: Vec<ChatMessage>) {
        let muted = std::mem::replace(&mut self.host.muted, true);
        self.process_messages(messages);
        self.host.muted = muted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_models::ChatChannel;
    use crate::config::TrackerConfig;

    fn state(min_run_start: u32) -> AppState {
        let mut state = AppState::with_config(AppConfig {
            log_directory: "/tmp/chatlogs".to_string(),
            tracker: TrackerConfig {
                min_run_start,
                ..Default::default()
            },
        });
        state.host.muted = true;
        state
    }

    fn public(sender: &str, text: &str) -> ChatMessage {
        ChatMessage::new(ChatChannel::Public, sender, text)
    }

    #[test]
    fn test_messages_ignored_without_session() {
        let mut state = state(1);
        state.process_message(public("alice", " "));
        assert_eq!(state.tracker.run_count(ChatChannel::Public), 0);
        assert!(state.host.board.is_empty());
    }

    #[test]
    fn test_counter_board_tracks_runs() {
        let mut state = state(2);
        state.start_session();
        state.process_messages(vec![
            public("alice", " "),
            public("bob", " "),
            public("carol", ""),
        ]);

        let counter = state.host.board.get(ChatChannel::Public).unwrap();
        assert_eq!(counter.count, 3);
        assert_eq!(counter.display_text, "Public Chat");
        assert_eq!(state.host.notifications(), 1);

        state.process_message(public("dave", "hi"));
        assert!(state.host.board.is_empty());
        assert_eq!(state.host.announcements(), 1);
    }

    #[test]
    fn test_stop_session_clears_counters() {
        let mut state = state(1);
        state.start_session();
        state.process_message(public("alice", " "));
        assert_eq!(state.host.board.len(), 1);

        state.stop_session();
        assert!(state.host.board.is_empty());
        assert!(state.tracker.active_runs().is_empty());

        // No state survives a stop/start cycle
        state.start_session();
        assert_eq!(state.tracker.run_count(ChatChannel::Public), 0);
    }

    #[test]
    fn test_config_change_applies_to_next_message() {
        let mut state = state(3);
        state.start_session();
        state.process_messages(vec![public("alice", " "), public("bob", " ")]);
        assert!(state.host.board.is_empty());

        state.config.tracker.duplicates_allowed = true;
        state.process_message(public("alice", " "));
        assert_eq!(state.host.board.get(ChatChannel::Public).unwrap().count, 3);
    }

    #[test]
    fn test_replay_restores_mute_flag() {
        let mut state = state(1);
        state.host.muted = false;
        state.start_session();
        state.replay_messages(vec![public("alice", " ")]);
        assert!(!state.host.muted);
        assert_eq!(state.host.board.len(), 1);
    }

    #[test]
    fn test_set_active_file() {
        let mut state = state(1);
        let path = state.set_active_file("chat_2025-03-14_20_15_00_123456.txt");
        assert_eq!(
            path,
            PathBuf::from("/tmp/chatlogs/chat_2025-03-14_20_15_00_123456.txt")
        );
        assert_eq!(
            state.chat_session_date,
            Some(time::macros::date!(2025 - 03 - 14))
        );

        let path = state.set_active_file("/var/log/other.txt");
        assert_eq!(path, PathBuf::from("/var/log/other.txt"));
        assert_eq!(state.chat_session_date, None);
    }
}
