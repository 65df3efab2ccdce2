use super::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content starting with this exact prefix encodes an invocable on-chain action.
pub const ACTION_LINK_PREFIX: &str = "https://dial.to/?action=solana-action:";

/// How a message body should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Text,
    ActionLink,
}

impl MessageKind {
    /// Case-sensitive prefix match at position 0, no URL parsing.
    pub fn classify(content: &str) -> Self {
        if content.starts_with(ACTION_LINK_PREFIX) {
            MessageKind::ActionLink
        } else {
            MessageKind::Text
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Text => "text",
            MessageKind::ActionLink => "action-link",
        }
    }
}

/// A message as persisted by the store. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque id assigned by the store
    pub id: String,
    /// Store-assigned insertion sequence, breaks `created_at` ties
    pub seq: u64,
    pub sender: Identity,
    pub recipient: Identity,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        MessageKind::classify(&self.content)
    }

    pub fn is_action_link(&self) -> bool {
        self.kind() == MessageKind::ActionLink
    }

    /// The other party relative to `viewer`.
    ///
    /// A message whose sender is not `viewer` yields the sender, even if the
    /// recipient is not `viewer` either.
    pub fn counterpart(&self, viewer: &Identity) -> &Identity {
        if &self.sender != viewer {
            &self.sender
        } else {
            &self.recipient
        }
    }

    /// True if `identity` is the sender or the recipient
    pub fn involves(&self, identity: &Identity) -> bool {
        &self.sender == identity || &self.recipient == identity
    }

    /// True if the message was exchanged between `a` and `b`, in either direction
    pub fn is_between(&self, a: &Identity, b: &Identity) -> bool {
        (&self.sender == a && &self.recipient == b) || (&self.sender == b && &self.recipient == a)
    }
}

/// A message before the store has assigned id, sequence and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender: Identity,
    pub recipient: Identity,
    pub content: String,
}

impl NewMessage {
    pub fn new(sender: Identity, recipient: Identity, content: impl Into<String>) -> Self {
        Self {
            sender,
            recipient,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn message(sender: &str, recipient: &str, content: &str) -> Message {
        Message {
            id: "m1".to_string(),
            seq: 1,
            sender: id(sender),
            recipient: id(recipient),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_action_link_classification() {
        assert_eq!(
            MessageKind::classify("https://dial.to/?action=solana-action:foo"),
            MessageKind::ActionLink
        );
        assert_eq!(MessageKind::classify("https://dial.to/other"), MessageKind::Text);
        assert_eq!(
            MessageKind::classify("hello https://dial.to/?action=solana-action:foo"),
            MessageKind::Text
        );
        assert_eq!(
            MessageKind::classify("HTTPS://DIAL.TO/?action=solana-action:foo"),
            MessageKind::Text
        );
        assert_eq!(MessageKind::classify(ACTION_LINK_PREFIX), MessageKind::ActionLink);
    }

    #[test]
    fn test_counterpart() {
        let alice = id("alice@example.com");
        let bob = id("bob@example.com");

        let outgoing = message("alice@example.com", "bob@example.com", "hi");
        assert_eq!(outgoing.counterpart(&alice), &bob);
        assert_eq!(outgoing.counterpart(&bob), &alice);
    }

    #[test]
    fn test_between_is_symmetric() {
        let alice = id("alice@example.com");
        let bob = id("bob@example.com");
        let carol = id("carol@example.com");

        let msg = message("bob@example.com", "alice@example.com", "hey");
        assert!(msg.is_between(&alice, &bob));
        assert!(msg.is_between(&bob, &alice));
        assert!(!msg.is_between(&alice, &carol));
        assert!(msg.involves(&alice));
        assert!(!msg.involves(&carol));
    }
}
