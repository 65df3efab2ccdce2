//! In-memory message store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::traits::{MessageFilter, MessageStore, SortOrder};
use crate::domain::entities::{Message, NewMessage};
use crate::application::errors::StoreError;

/// Source of `created_at` values
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Default)]
struct Log {
    messages: Vec<Message>,
    next_seq: u64,
}

/// Vec-backed store, mainly for tests and the `--in-memory` CLI mode
pub struct InMemoryStore {
    log: Arc<RwLock<Log>>,
    clock: Clock,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Use `clock` to stamp appended messages
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            log: Arc::new(RwLock::new(Log::default())),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn append(&self, message: NewMessage) -> Result<Message, StoreError> {
        let mut log = self.log.write().await;
        let seq = log.next_seq;
        log.next_seq += 1;

        let stored = Message {
            id: uuid::Uuid::new_v4().to_string(),
            seq,
            sender: message.sender,
            recipient: message.recipient,
            content: message.content,
            created_at: (self.clock)(),
        };
        log.messages.push(stored.clone());
        Ok(stored)
    }

    async fn query(&self, filter: &MessageFilter, order: SortOrder) -> Result<Vec<Message>, StoreError> {
        let log = self.log.read().await;
        let mut matching: Vec<Message> = log.messages
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        matching.sort_by(|a, b| order.compare(a, b));
        Ok(matching)
    }
}
