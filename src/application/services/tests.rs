use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use super::MessagingService;
use crate::application::errors::StoreError;
use crate::domain::entities::{Identity, Message, NewMessage};
use crate::domain::traits::{MessageFilter, MessageStore, SortOrder};
use crate::infrastructure::storage::InMemoryStore;

fn id(s: &str) -> Identity {
    Identity::new(s).unwrap()
}

/// Clock the test moves by hand
#[derive(Clone)]
struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap())))
    }

    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }

    fn advance(&self, by: Duration) -> DateTime<Utc> {
        let mut at = self.0.lock().unwrap();
        *at = *at + by;
        *at
    }
}

fn service_with_clock() -> (MessagingService<InMemoryStore>, ManualClock) {
    let clock = ManualClock::new();
    let reader = clock.clone();
    let store = InMemoryStore::with_clock(Arc::new(move || reader.now()));
    (MessagingService::new(store), clock)
}

/// Store that rejects everything
struct BrokenStore;

#[async_trait]
impl MessageStore for BrokenStore {
    async fn append(&self, _message: NewMessage) -> Result<Message, StoreError> {
        Err(StoreError::Rejected("row-level security".to_string()))
    }

    async fn query(&self, _filter: &MessageFilter, _order: SortOrder) -> Result<Vec<Message>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_conversation_messages_oldest_first_and_symmetric() {
    let (service, clock) = service_with_clock();
    let (a, b, c) = (id("a@x.io"), id("b@x.io"), id("c@x.io"));

    service.send_message(&a, &b, "one").await.unwrap();
    clock.advance(Duration::seconds(1));
    service.send_message(&b, &a, "two").await.unwrap();
    clock.advance(Duration::seconds(1));
    service.send_message(&a, &c, "elsewhere").await.unwrap();
    clock.advance(Duration::seconds(1));
    service.send_message(&a, &b, "three").await.unwrap();

    let ab = service.get_conversation_messages(&a, &b).await.unwrap();
    let ba = service.get_conversation_messages(&b, &a).await.unwrap();

    let contents: Vec<_> = ab.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
    assert!(ab.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    assert_eq!(ab, ba);
}

#[tokio::test]
async fn test_conversations_one_per_counterpart() {
    let (service, clock) = service_with_clock();
    let (a, b, c) = (id("a@x.io"), id("b@x.io"), id("c@x.io"));

    service.send_message(&a, &b, "hi").await.unwrap();
    let t2 = clock.advance(Duration::seconds(10));
    service.send_message(&b, &a, "hey").await.unwrap();
    let t3 = clock.advance(Duration::seconds(10));
    service.send_message(&a, &c, "sup").await.unwrap();

    let conversations = service.get_conversations(&a).await.unwrap();
    assert_eq!(conversations.len(), 2);

    let with_b = conversations.iter().find(|conv| conv.counterpart == b).unwrap();
    assert_eq!(with_b.last_message_content, "hey");
    assert_eq!(with_b.last_message_timestamp, t2);

    let with_c = conversations.iter().find(|conv| conv.counterpart == c).unwrap();
    assert_eq!(with_c.last_message_content, "sup");
    assert_eq!(with_c.last_message_timestamp, t3);

    // Newest conversation first
    assert_eq!(conversations[0].counterpart, c);
}

#[tokio::test]
async fn test_conversation_tie_resolved_by_store_order() {
    let (service, _clock) = service_with_clock();
    let (a, b) = (id("a@x.io"), id("b@x.io"));

    // Same created_at for both
    service.send_message(&a, &b, "first").await.unwrap();
    service.send_message(&b, &a, "second").await.unwrap();

    let conversations = service.get_conversations(&a).await.unwrap();
    assert_eq!(conversations.len(), 1);
    // The store places the later append first under descending order
    assert_eq!(conversations[0].last_message_content, "second");

    let thread = service.get_conversation_messages(&a, &b).await.unwrap();
    assert_eq!(thread[0].content, "first");
    assert_eq!(thread[1].content, "second");
}

#[tokio::test]
async fn test_send_then_read_round_trip() {
    let service = MessagingService::new(InMemoryStore::new());
    let (a, b) = (id("a@x.io"), id("b@x.io"));

    let sent = service.send_message(&a, &b, "x").await.unwrap();
    let thread = service.get_conversation_messages(&a, &b).await.unwrap();

    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].content, "x");
    assert_eq!(thread[0].id, sent.id);
    assert_eq!(thread[0].sender, a);
    assert_eq!(thread[0].recipient, b);
}

#[tokio::test]
async fn test_no_messages_means_no_conversations() {
    let service = MessagingService::new(InMemoryStore::new());
    let conversations = service.get_conversations(&id("nobody@x.io")).await.unwrap();
    assert!(conversations.is_empty());
}

#[tokio::test]
async fn test_receive_messages_newest_first() {
    let (service, clock) = service_with_clock();
    let (a, b, c) = (id("a@x.io"), id("b@x.io"), id("c@x.io"));

    service.send_message(&b, &a, "old").await.unwrap();
    clock.advance(Duration::seconds(1));
    service.send_message(&b, &c, "not mine").await.unwrap();
    clock.advance(Duration::seconds(1));
    service.send_message(&a, &c, "new").await.unwrap();

    let inbox = service.receive_messages(&a).await.unwrap();
    let contents: Vec<_> = inbox.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["new", "old"]);
}

#[tokio::test]
async fn test_identities_are_not_normalized() {
    let service = MessagingService::new(InMemoryStore::new());
    let a = id("a@x.io");

    service.send_message(&a, &id("Bob@x.io"), "one").await.unwrap();
    service.send_message(&a, &id("bob@x.io"), "two").await.unwrap();

    let conversations = service.get_conversations(&a).await.unwrap();
    assert_eq!(conversations.len(), 2);
}

#[tokio::test]
async fn test_store_errors_pass_through() {
    let service = MessagingService::new(BrokenStore);
    let (a, b) = (id("a@x.io"), id("b@x.io"));

    let err = service.send_message(&a, &b, "x").await.unwrap_err();
    assert!(matches!(err, StoreError::Rejected(ref why) if why == "row-level security"));

    assert!(matches!(
        service.get_conversation_messages(&a, &b).await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(matches!(service.get_conversations(&a).await, Err(StoreError::Unavailable(_))));
    assert!(matches!(service.receive_messages(&a).await, Err(StoreError::Unavailable(_))));
}
