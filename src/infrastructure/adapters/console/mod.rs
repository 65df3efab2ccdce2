//! Console rendering of messages and conversation lists

use chrono::{DateTime, Local, Utc};
use crate::domain::entities::{Conversation, Identity, Message, MessageKind};

/// Formats domain objects as terminal lines from one identity's point of view
pub struct ConsoleRenderer {
    viewer: Identity,
}

impl ConsoleRenderer {
    pub fn new(viewer: Identity) -> Self {
        Self { viewer }
    }

    pub fn viewer(&self) -> &Identity {
        &self.viewer
    }

    /// `[12:01] you: hi` or `[12:02] bob@x.io: [action] https://dial.to/...`
    pub fn message(&self, message: &Message) -> String {
        let who = if message.sender == self.viewer {
            "you".to_string()
        } else {
            message.sender.to_string()
        };
        format!(
            "[{}] {}: {}",
            clock_time(message.created_at),
            who,
            body(message)
        )
    }

    /// `bob@x.io  Yesterday  hey there`
    pub fn conversation(&self, conversation: &Conversation, now: DateTime<Utc>) -> String {
        let preview = match MessageKind::classify(&conversation.last_message_content) {
            MessageKind::ActionLink => "[action]".to_string(),
            MessageKind::Text => preview(&conversation.last_message_content, 50),
        };
        format!(
            "{}  {}  {}",
            conversation.counterpart,
            conversation.timestamp_label(now),
            preview
        )
    }
}

fn body(message: &Message) -> String {
    match message.kind() {
        MessageKind::ActionLink => format!("[action] {}", message.content),
        MessageKind::Text => message.content.clone(),
    }
}

fn clock_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// First line of `text`, cut to `max` characters
fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    let mut cut: String = line.chars().take(max).collect();
    if line.chars().count() > max || text.lines().nth(1).is_some() {
        cut.push_str("...");
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn message(sender: &str, content: &str) -> Message {
        Message {
            id: "m1".to_string(),
            seq: 1,
            sender: id(sender),
            recipient: id("other@x.io"),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_own_messages_say_you() {
        let renderer = ConsoleRenderer::new(id("a@x.io"));
        let line = renderer.message(&message("a@x.io", "hi"));
        assert!(line.ends_with("] you: hi"), "{}", line);

        let line = renderer.message(&message("b@x.io", "hey"));
        assert!(line.ends_with("] b@x.io: hey"), "{}", line);
    }

    #[test]
    fn test_action_links_are_tagged() {
        let renderer = ConsoleRenderer::new(id("a@x.io"));
        let line = renderer.message(&message("b@x.io", "https://dial.to/?action=solana-action:tip"));
        assert!(line.ends_with("[action] https://dial.to/?action=solana-action:tip"), "{}", line);
    }

    #[test]
    fn test_conversation_line() {
        let renderer = ConsoleRenderer::new(id("a@x.io"));
        let now = Utc.with_ymd_and_hms(2024, 9, 12, 9, 0, 0).unwrap();
        let conversation = Conversation {
            counterpart: id("b@x.io"),
            last_message_content: "see you\ntomorrow".to_string(),
            last_message_timestamp: now - Duration::hours(26),
        };
        assert_eq!(renderer.conversation(&conversation, now), "b@x.io  Yesterday  see you...");
    }

    #[test]
    fn test_preview_cuts_long_lines() {
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
        assert_eq!(preview("", 3), "");
    }
}
