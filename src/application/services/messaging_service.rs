use crate::application::errors::StoreError;
use crate::domain::entities::{Conversation, Identity, Message, NewMessage};
use crate::domain::traits::{MessageFilter, MessageStore, SortOrder};

/// Service for sending and reading direct messages
///
/// Holds no state of its own beyond the injected store; every call reads
/// or writes through to it and store errors are returned unchanged.
pub struct MessagingService<S: MessageStore> {
    store: S,
}

impl<S: MessageStore> MessagingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append one message; the store assigns id, sequence and timestamp.
    pub async fn send_message(
        &self,
        sender: &Identity,
        recipient: &Identity,
        content: &str,
    ) -> Result<Message, StoreError> {
        let draft = NewMessage::new(sender.clone(), recipient.clone(), content);
        let message = self.store.append(draft).await?;
        tracing::debug!("Sent {} from {} to {}", message.id, sender, recipient);
        Ok(message)
    }

    /// Every message exchanged between `a` and `b`, oldest first.
    ///
    /// Argument order does not matter.
    pub async fn get_conversation_messages(
        &self,
        a: &Identity,
        b: &Identity,
    ) -> Result<Vec<Message>, StoreError> {
        let filter = MessageFilter::Between(a.clone(), b.clone());
        self.store.query(&filter, SortOrder::Ascending).await
    }

    /// One summary per counterpart of `identity`, most recent conversation first.
    pub async fn get_conversations(&self, identity: &Identity) -> Result<Vec<Conversation>, StoreError> {
        let history = self.receive_messages(identity).await?;
        let conversations = Conversation::aggregate(identity, &history);
        tracing::debug!(
            "Aggregated {} messages into {} conversations for {}",
            history.len(),
            conversations.len(),
            identity
        );
        Ok(conversations)
    }

    /// Every message sent or received by `identity`, newest first.
    pub async fn receive_messages(&self, identity: &Identity) -> Result<Vec<Message>, StoreError> {
        let filter = MessageFilter::Involving(identity.clone());
        self.store.query(&filter, SortOrder::Descending).await
    }
}
