//! Polling synchronization - keeps displayed views fresh without a push channel

pub mod poller;
pub mod snapshot;
pub mod view;


pub use poller::{ConversationPoller, PollStats, PollerConfig, DEFAULT_POLL_INTERVAL};
pub use snapshot::Snapshot;
pub use view::{ChatView, InboxView};
