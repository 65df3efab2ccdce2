//! Live conversation and inbox views built on the poller

use std::sync::Arc;

use tokio::sync::watch;

use super::poller::{ConversationPoller, PollStats, PollerConfig};
use super::snapshot::Snapshot;
use crate::application::errors::StoreError;
use crate::application::services::MessagingService;
use crate::domain::entities::{Conversation, Identity, Message};
use crate::domain::traits::MessageStore;

/// An open one-to-one conversation kept fresh by polling
pub struct ChatView<S: MessageStore + 'static> {
    service: Arc<MessagingService<S>>,
    me: Identity,
    counterpart: Identity,
    config: PollerConfig,
    snapshot: Arc<Snapshot<Vec<Message>>>,
    poller: ConversationPoller<Vec<Message>>,
}

impl<S: MessageStore + 'static> ChatView<S> {
    pub fn open(
        service: Arc<MessagingService<S>>,
        me: Identity,
        counterpart: Identity,
        config: PollerConfig,
    ) -> Self {
        let snapshot = Arc::new(Snapshot::new());
        let poller = poll_conversation(&service, &me, &counterpart, config, snapshot.clone());
        tracing::info!("Opened conversation {} <-> {}", me, counterpart);

        Self {
            service,
            me,
            counterpart,
            config,
            snapshot,
            poller,
        }
    }

    pub fn me(&self) -> &Identity {
        &self.me
    }

    pub fn counterpart(&self) -> &Identity {
        &self.counterpart
    }

    /// Messages from the latest accepted fetch, oldest first
    pub fn messages(&self) -> Option<Arc<Vec<Message>>> {
        self.snapshot.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Vec<Message>>>> {
        self.snapshot.subscribe()
    }

    pub fn stats(&self) -> &PollStats {
        self.poller.stats()
    }

    pub fn refresh(&self) {
        self.poller.refresh();
    }

    /// Send `content` to the counterpart and refresh right away.
    ///
    /// Whitespace-only input is ignored and yields `Ok(None)`.
    pub async fn send(&self, content: &str) -> Result<Option<Message>, StoreError> {
        if content.trim().is_empty() {
            return Ok(None);
        }

        let message = self.service.send_message(&self.me, &self.counterpart, content).await?;
        self.poller.refresh();
        Ok(Some(message))
    }

    /// Retarget the view. Results still in flight for the previous
    /// counterpart are discarded.
    pub async fn switch_to(&mut self, counterpart: Identity) {
        let next = poll_conversation(&self.service, &self.me, &counterpart, self.config, self.snapshot.clone());
        let previous = std::mem::replace(&mut self.poller, next);
        previous.teardown().await;

        tracing::info!("Switched conversation {} -> {}", self.counterpart, counterpart);
        self.counterpart = counterpart;
    }

    pub async fn close(self) {
        self.poller.teardown().await;
        tracing::info!("Closed conversation {} <-> {}", self.me, self.counterpart);
    }
}

/// The conversation list of one identity kept fresh by polling
pub struct InboxView {
    me: Identity,
    snapshot: Arc<Snapshot<Vec<Conversation>>>,
    poller: ConversationPoller<Vec<Conversation>>,
}

impl InboxView {
    pub fn open<S: MessageStore + 'static>(
        service: Arc<MessagingService<S>>,
        me: Identity,
        config: PollerConfig,
    ) -> Self {
        let snapshot = Arc::new(Snapshot::new());
        let owner = me.clone();
        let poller = ConversationPoller::spawn(config, snapshot.clone(), move || {
            let service = service.clone();
            let owner = owner.clone();
            async move { service.get_conversations(&owner).await }
        });

        Self { me, snapshot, poller }
    }

    pub fn me(&self) -> &Identity {
        &self.me
    }

    pub fn conversations(&self) -> Option<Arc<Vec<Conversation>>> {
        self.snapshot.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Vec<Conversation>>>> {
        self.snapshot.subscribe()
    }

    pub fn stats(&self) -> &PollStats {
        self.poller.stats()
    }

    pub fn refresh(&self) {
        self.poller.refresh();
    }

    pub async fn close(self) {
        self.poller.teardown().await;
    }
}

fn poll_conversation<S: MessageStore + 'static>(
    service: &Arc<MessagingService<S>>,
    me: &Identity,
    counterpart: &Identity,
    config: PollerConfig,
    snapshot: Arc<Snapshot<Vec<Message>>>,
) -> ConversationPoller<Vec<Message>> {
    let service = service.clone();
    let me = me.clone();
    let counterpart = counterpart.clone();

    ConversationPoller::spawn(config, snapshot, move || {
        let service = service.clone();
        let me = me.clone();
        let counterpart = counterpart.clone();
        async move { service.get_conversation_messages(&me, &counterpart).await }
    })
}
