use crate::chat_models::{ChatChannel, ChatMessage};
use memchr::memchr;
use time::Time;

// [21:04:13] public Galen Ayder:
// [21:04:15] clan Raina Temple: anyone up for a raid?

/// Parse one chat log line. Returns None for malformed lines.
pub fn parse_line(line_number: u64, line: &str) -> Option<ChatMessage> {
    let line = strip_line_terminator(line);
    let (remaining, timestamp) = parse_timestamp(line)?;
    let (remaining, channel) = parse_channel(remaining)?;
    let (sender, text) = parse_sender_text(remaining)?;

    Some(ChatMessage {
        line_number,
        timestamp,
        channel,
        sender: sender.to_string(),
        text: text.to_string(),
    })
}

/// Drop the trailing `\n` or `\r\n`. Message whitespace is left untouched.
pub fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

pub fn parse_timestamp(input: &str) -> Option<(&str, Time)> {
    let b = input.as_bytes();
    if b.len() < 11 || b[0] != b'[' || b[3] != b':' || b[6] != b':' || b[9] != b']' || b[10] != b' '
    {
        return None;
    }

    let hour = two_digits(b[1], b[2])?;
    let minute = two_digits(b[4], b[5])?;
    let second = two_digits(b[7], b[8])?;
    let time = Time::from_hms(hour, minute, second).ok()?;

    Some((&input[11..], time))
}

fn two_digits(hi: u8, lo: u8) -> Option<u8> {
    if !hi.is_ascii_digit() || !lo.is_ascii_digit() {
        return None;
    }
    Some((hi - b'0') * 10 + (lo - b'0'))
}

pub fn parse_channel(input: &str) -> Option<(&str, ChatChannel)> {
    let space_pos = memchr(b' ', input.as_bytes())?;
    let channel = ChatChannel::from_tag(&input[..space_pos])?;
    Some((&input[space_pos + 1..], channel))
}

/// Split `sender: text`. The single space after the colon is the separator;
/// anything after it, whitespace included, is the message text.
pub fn parse_sender_text(input: &str) -> Option<(&str, &str)> {
    let colon_pos = memchr(b':', input.as_bytes())?;
    let sender = &input[..colon_pos];
    if sender.is_empty() {
        return None;
    }

    let rest = &input[colon_pos + 1..];
    let text = match rest.strip_prefix(' ') {
        Some(text) => text,
        None if rest.is_empty() => rest,
        None => return None,
    };

    Some((sender, text))
}
