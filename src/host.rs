//! Host side of the tracker: renders the actions the tracker emits.

use crate::chat_models::{ChatChannel, TRACKED_CHANNELS};
use crate::tracker::Action;
use hashbrown::HashMap;
use std::io::Write;

/// Trait for anything that executes tracker actions.
/// Actions for one message must be applied in the order they were emitted.
pub trait ActionSink {
    fn apply(&mut self, action: &Action);

    fn apply_all(&mut self, actions: &[Action]) {
        for action in actions {
            self.apply(action);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterEntry {
    pub display_text: &'static str,
    pub count: u32,
}

/// On-screen run counters, one per channel at most.
#[derive(Debug, Default)]
pub struct CounterBoard {
    counters: HashMap<ChatChannel, CounterEntry>,
}

impl CounterBoard {
    pub fn show(&mut self, channel: ChatChannel, display_text: &'static str, count: u32) {
        self.counters
            .insert(channel, CounterEntry { display_text, count });
    }

    pub fn remove(&mut self, channel: ChatChannel) -> Option<CounterEntry> {
        self.counters.remove(&channel)
    }

    pub fn get(&self, channel: ChatChannel) -> Option<&CounterEntry> {
        self.counters.get(&channel)
    }

    /// Visible counters in tracked-channel order
    pub fn entries(&self) -> Vec<(ChatChannel, &CounterEntry)> {
        TRACKED_CHANNELS
            .iter()
            .filter_map(|channel| self.counters.get(channel).map(|e| (*channel, e)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

/// Prints announcements and notifications to the terminal and keeps the
/// counter board up to date.
#[derive(Debug, Default)]
pub struct ConsoleHost {
    pub board: CounterBoard,
    /// Suppresses terminal output (used while catching up on existing log lines)
    pub muted: bool,
    announcements: u64,
    notifications: u64,
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn announcements(&self) -> u64 {
        self.announcements
    }

    pub fn notifications(&self) -> u64 {
        self.notifications
    }

    fn print(&self, line: &str) {
        if self.muted {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

impl ActionSink for ConsoleHost {
    fn apply(&mut self, action: &Action) {
        match action {
            Action::AnnounceInChat { text, .. } => {
                self.announcements += 1;
                self.print(&format!("[Game] {text}"));
            }
            Action::Notify { text } => {
                self.notifications += 1;
                tracing::info!(text = %text, "Notification");
                self.print(&format!("[Notify] {text}"));
            }
            Action::ShowCounter {
                channel,
                display_text,
                count,
            } => {
                self.board.show(*channel, *display_text, *count);
                tracing::debug!(channel = channel.tag(), count, "Counter updated");
            }
            Action::RemoveCounter { channel } => {
                if self.board.remove(*channel).is_some() {
                    tracing::debug!(channel = channel.tag(), "Counter removed");
                }
            }
        }
    }
}
