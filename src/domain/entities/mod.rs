//! Domain entities - Core messaging objects with no infrastructure dependencies

pub mod identity;
pub mod message;
pub mod conversation;

pub use identity::Identity;
pub use message::{Message, MessageKind, NewMessage, ACTION_LINK_PREFIX};
pub use conversation::{relative_day_label, relative_day_label_in, Conversation};
