use async_trait::async_trait;
use std::cmp::Ordering;
use crate::application::errors::StoreError;
use crate::domain::entities::{Identity, Message, NewMessage};

/// Which messages a query selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFilter {
    /// `sender = X OR recipient = X`
    Involving(Identity),
    /// `(sender = X AND recipient = Y) OR (sender = Y AND recipient = X)`
    Between(Identity, Identity),
}

impl MessageFilter {
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            MessageFilter::Involving(identity) => message.involves(identity),
            MessageFilter::Between(a, b) => message.is_between(a, b),
        }
    }
}

/// Direction of the `created_at` ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Compare by `created_at`, then by `seq`, both in this direction.
    pub fn compare(&self, a: &Message, b: &Message) -> Ordering {
        let ascending = a
            .created_at
            .cmp(&b.created_at)
            .then_with(|| a.seq.cmp(&b.seq));
        match self {
            SortOrder::Ascending => ascending,
            SortOrder::Descending => ascending.reverse(),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// MessageStore trait - append-only message persistence
///
/// Implementations own id, sequence and timestamp assignment. Results of
/// `query` are ordered by `created_at` with ties broken by `seq` in the
/// same direction.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append(&self, message: NewMessage) -> Result<Message, StoreError>;

    async fn query(&self, filter: &MessageFilter, order: SortOrder) -> Result<Vec<Message>, StoreError>;
}

#[async_trait]
impl<S: MessageStore + ?Sized> MessageStore for std::sync::Arc<S> {
    async fn append(&self, message: NewMessage) -> Result<Message, StoreError> {
        (**self).append(message).await
    }

    async fn query(&self, filter: &MessageFilter, order: SortOrder) -> Result<Vec<Message>, StoreError> {
        (**self).query(filter, order).await
    }
}
