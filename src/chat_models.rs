use phf::phf_map;
use time::Time;

/// Chat channel categories that show up in the chat log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChatChannel {
    #[default]
    Public,
    FriendsChat,
    ClanChat,
    ClanGuestChat,
    Private,
    Game,
    Trade,
    Broadcast,
}

/// Channels that take part in run tracking. Everything else is ignored.
pub const TRACKED_CHANNELS: [ChatChannel; 4] = [
    ChatChannel::Public,
    ChatChannel::FriendsChat,
    ChatChannel::ClanChat,
    ChatChannel::ClanGuestChat,
];

/// Channel lookup by log tag
pub static CHANNEL_TAGS: phf::Map<&'static str, ChatChannel> = phf_map! {
    "public" => ChatChannel::Public,
    "friends" => ChatChannel::FriendsChat,
    "clan" => ChatChannel::ClanChat,
    "guest" => ChatChannel::ClanGuestChat,
    "private" => ChatChannel::Private,
    "game" => ChatChannel::Game,
    "trade" => ChatChannel::Trade,
    "broadcast" => ChatChannel::Broadcast,
};

/// Display names for tracked channels, keyed by log tag
static CHANNEL_DISPLAY_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "public" => "Public Chat",
    "friends" => "Friends Chat",
    "clan" => "Clan Chat",
    "guest" => "Clan Guest Chat",
};

const FALLBACK_DISPLAY_NAME: &str = "Chat";

impl ChatChannel {
    pub fn from_tag(tag: &str) -> Option<Self> {
        CHANNEL_TAGS.get(tag).copied()
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ChatChannel::Public => "public",
            ChatChannel::FriendsChat => "friends",
            ChatChannel::ClanChat => "clan",
            ChatChannel::ClanGuestChat => "guest",
            ChatChannel::Private => "private",
            ChatChannel::Game => "game",
            ChatChannel::Trade => "trade",
            ChatChannel::Broadcast => "broadcast",
        }
    }

    pub fn is_tracked(&self) -> bool {
        TRACKED_CHANNELS.contains(self)
    }

    /// Human readable name used in announcements and on the counter board.
    pub fn display_name(&self) -> &'static str {
        CHANNEL_DISPLAY_NAMES
            .get(self.tag())
            .copied()
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub line_number: u64,
    pub timestamp: Time,
    pub channel: ChatChannel,
    pub sender: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(channel: ChatChannel, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            line_number: 0,
            timestamp: Time::MIDNIGHT,
            channel,
            sender: sender.into(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_channels() {
        assert!(ChatChannel::Public.is_tracked());
        assert!(ChatChannel::FriendsChat.is_tracked());
        assert!(ChatChannel::ClanChat.is_tracked());
        assert!(ChatChannel::ClanGuestChat.is_tracked());
        assert!(!ChatChannel::Private.is_tracked());
        assert!(!ChatChannel::Game.is_tracked());
        assert!(!ChatChannel::Trade.is_tracked());
        assert!(!ChatChannel::Broadcast.is_tracked());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ChatChannel::Public.display_name(), "Public Chat");
        assert_eq!(ChatChannel::FriendsChat.display_name(), "Friends Chat");
        assert_eq!(ChatChannel::ClanChat.display_name(), "Clan Chat");
        assert_eq!(ChatChannel::ClanGuestChat.display_name(), "Clan Guest Chat");
        assert_eq!(ChatChannel::Trade.display_name(), "Chat");
    }

    #[test]
    fn test_tag_lookup_matches_tag() {
        for (tag, channel) in CHANNEL_TAGS.entries() {
            assert_eq!(channel.tag(), *tag);
        }
        assert_eq!(ChatChannel::from_tag("clan"), Some(ChatChannel::ClanChat));
        assert_eq!(ChatChannel::from_tag("shout"), None);
    }
}
