//! Direct messaging between email identities over a pluggable message store.
//!
//! [`MessagingService`] sends and reads messages and folds a viewer's
//! history into one [`Conversation`] per counterpart. [`ChatView`] and
//! [`InboxView`] keep a displayed thread or inbox fresh by polling.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::errors::{AppError, ConfigError, IdentityError, StoreError};
pub use application::services::MessagingService;
pub use application::sync::{ChatView, ConversationPoller, InboxView, PollerConfig, Snapshot};
pub use domain::entities::{Conversation, Identity, Message, MessageKind, NewMessage};
pub use domain::traits::{MessageFilter, MessageStore, SortOrder};
pub use infrastructure::config::Config;
pub use infrastructure::database::SqliteStore;
pub use infrastructure::storage::InMemoryStore;
