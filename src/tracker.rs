//! Per-channel spacebar run tracking.
//!
//! A run is a streak of whitespace-only messages in one tracked channel. Each
//! message either extends the current run or breaks it. Runs that reach the
//! configured threshold get an on-screen counter (and optionally a
//! notification); when such a run breaks, the outcome is announced in chat.

use crate::chat_models::{ChatChannel, ChatMessage, TRACKED_CHANNELS};
use crate::config::TrackerConfig;
use hashbrown::{HashMap, HashSet};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakReason {
    /// The breaking message contained something other than whitespace
    NonWhitespace,
    /// The sender already contributed to the current run
    AlreadyContributing,
    /// Fallback when neither classification applies
    Unknown,
}

impl BreakReason {
    fn classify(is_qualifying: bool, is_contributor_allowed: bool) -> Self {
        if !is_qualifying {
            BreakReason::NonWhitespace
        } else if !is_contributor_allowed {
            BreakReason::AlreadyContributing
        } else {
            BreakReason::Unknown
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            BreakReason::NonWhitespace => "non-whitespace",
            BreakReason::AlreadyContributing => "already-contributing",
            BreakReason::Unknown => "unknown",
        }
    }

    /// Phrase used in the chat announcement.
    pub fn phrase(&self) -> &'static str {
        match self {
            BreakReason::NonWhitespace => "a non-spacebar message",
            BreakReason::AlreadyContributing => "already contributing",
            BreakReason::Unknown => "unknown reasons",
        }
    }
}

/// Summary of a started run that was just broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEnd {
    pub sender: String,
    pub channel_name: &'static str,
    pub count: u32,
    pub reason: BreakReason,
}

impl RunEnd {
    pub fn announcement(&self) -> String {
        format!(
            "{} ended the spacebar check with run of {} in {} for {}.",
            self.sender,
            self.count,
            self.channel_name,
            self.reason.phrase()
        )
    }
}

/// Instructions for the host, applied in the order they are returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Post a game message into chat
    AnnounceInChat {
        channel: ChatChannel,
        text: String,
        end: RunEnd,
    },
    /// Raise an out-of-band notification
    Notify { text: String },
    /// Create or update the channel's on-screen counter
    ShowCounter {
        channel: ChatChannel,
        display_text: &'static str,
        count: u32,
    },
    /// Remove the channel's on-screen counter
    RemoveCounter { channel: ChatChannel },
}

/// One channel's run. `count` is zero exactly when `contributors` is empty.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    count: u32,
    contributors: HashSet<String>,
    counter_visible: bool,
}

impl RunState {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn contributors(&self) -> impl Iterator<Item = &str> {
        self.contributors.iter().map(String::as_str)
    }

    pub fn has_contributed(&self, sender: &str) -> bool {
        self.contributors.contains(sender)
    }

    pub fn counter_visible(&self) -> bool {
        self.counter_visible
    }

    fn contribute(&mut self, sender: &str) {
        self.count = self.count.saturating_add(1);
        if !self.contributors.contains(sender) {
            self.contributors.insert(sender.to_string());
        }
    }

    /// Clear the run. Returns whether a counter was showing.
    fn reset(&mut self) -> bool {
        self.count = 0;
        self.contributors.clear();
        std::mem::take(&mut self.counter_visible)
    }
}

/// Returns true for text made only of whitespace, including the empty string.
///
/// Whitespace is the ASCII set: space, tab, line feed, vertical tab, form feed
/// and carriage return. Non-breaking and other Unicode spaces do not qualify.
pub fn is_all_whitespace(text: &str) -> bool {
    text.bytes()
        .all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\x0B' | b'\x0C' | b'\r'))
}

#[derive(Debug, Default)]
pub struct RunTracker {
    runs: HashMap<ChatChannel, RunState>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one chat message to its channel's run.
    ///
    /// Messages from untracked channels are ignored and leave no state behind.
    pub fn handle_message(&mut self, message: &ChatMessage, config: &TrackerConfig) -> Vec<Action> {
        let channel = message.channel;
        if !channel.is_tracked() {
            return Vec::new();
        }

        let threshold = config.run_start_threshold();
        let mut actions = Vec::new();

        let run = self.runs.entry(channel).or_default();
        let is_qualifying = is_all_whitespace(&message.text);
        let is_contributor_allowed =
            config.duplicates_allowed || !run.has_contributed(&message.sender);
        let continues_run = is_qualifying && is_contributor_allowed;

        if continues_run {
            run.contribute(&message.sender);
            tracing::debug!(
                channel = channel.tag(),
                sender = %message.sender,
                count = run.count,
                "Run continued"
            );
        } else {
            if run.count > 0 && run.count >= threshold {
                let end = RunEnd {
                    sender: message.sender.clone(),
                    channel_name: channel.display_name(),
                    count: run.count,
                    reason: BreakReason::classify(is_qualifying, is_contributor_allowed),
                };
                tracing::info!(
                    channel = channel.tag(),
                    sender = %end.sender,
                    count = end.count,
                    reason = end.reason.tag(),
                    "Run ended"
                );
                actions.push(Action::AnnounceInChat {
                    channel,
                    text: end.announcement(),
                    end,
                });
            }
            actions.extend(self.reset_channel(channel));
        }

        let run = self.runs.entry(channel).or_default();
        if run.count > 0 && run.count == threshold {
            run.counter_visible = true;
            tracing::info!(channel = channel.tag(), count = run.count, "Run started");
            actions.push(Action::ShowCounter {
                channel,
                display_text: channel.display_name(),
                count: run.count,
            });
            if config.notify_on_start {
                actions.push(Action::Notify {
                    text: format!(
                        "A new spacebar check started in {}!",
                        channel.display_name()
                    ),
                });
            }
        } else if continues_run && run.count > threshold {
            run.counter_visible = true;
            actions.push(Action::ShowCounter {
                channel,
                display_text: channel.display_name(),
                count: run.count,
            });
        }

        actions
    }

    /// Clear one channel's run, returning a counter removal if one was shown.
    pub fn reset_channel(&mut self, channel: ChatChannel) -> Option<Action> {
        let was_visible = self.runs.get_mut(&channel)?.reset();
        was_visible.then_some(Action::RemoveCounter { channel })
    }

    /// Clear every channel's run.
    pub fn reset_all(&mut self) -> Vec<Action> {
        let actions = TRACKED_CHANNELS
            .iter()
            .filter_map(|channel| self.reset_channel(*channel))
            .collect();
        self.runs.clear();
        tracing::debug!("All runs reset");
        actions
    }

    /// Session start hook.
    pub fn on_start(&mut self) -> Vec<Action> {
        self.reset_all()
    }

    /// Session stop hook.
    pub fn on_stop(&mut self) -> Vec<Action> {
        self.reset_all()
    }

    // Accessor methods

    pub fn run(&self, channel: ChatChannel) -> Option<&RunState> {
        self.runs.get(&channel)
    }

    pub fn run_count(&self, channel: ChatChannel) -> u32 {
        self.runs.get(&channel).map(RunState::count).unwrap_or(0)
    }

    pub fn contributors(&self, channel: ChatChannel) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .runs
            .get(&channel)
            .map(|r| r.contributors().collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Channels with a run in progress, in tracked-channel order.
    pub fn active_runs(&self) -> Vec<(ChatChannel, u32)> {
        TRACKED_CHANNELS
            .iter()
            .map(|channel| (*channel, self.run_count(*channel)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Number of channels holding state (tracked channels that have seen a message).
    pub fn channel_count(&self) -> usize {
        self.runs.len()
    }
}
