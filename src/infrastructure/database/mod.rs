//! SQLite message store

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::application::errors::StoreError;
use crate::domain::entities::{Identity, Message, NewMessage};
use crate::domain::traits::{MessageFilter, MessageStore, SortOrder};
use crate::infrastructure::storage::Clock;

/// Row as read back from the `messages` table, before validation
struct MessageRow {
    seq: i64,
    id: String,
    sender: String,
    recipient: String,
    content: String,
    created_at: String,
}

/// Message store over one SQLite connection. Statements run on tokio's
/// blocking pool.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    clock: Clock,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        tracing::info!("Opened message database at {}", path.as_ref().display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: Arc::new(Utc::now),
        };
        {
            let conn = lock(&store.conn)?;
            init_tables(&conn)?;
        }
        Ok(store)
    }

    /// Use `clock` to stamp appended messages
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run `job` against the connection on the blocking pool
    async fn with_connection<T, F>(&self, job: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;
            job(&guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("database task failed: {}", e)))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
}

fn init_tables(conn: &Connection) -> Result<(), StoreError> {
    // seq doubles as the tie-break for equal created_at values
    conn.execute(
        "CREATE TABLE IF NOT EXISTS messages (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT UNIQUE NOT NULL,
            sender TEXT NOT NULL,
            recipient TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at, seq)",
        [],
    )?;

    Ok(())
}

fn insert(conn: &Connection, message: NewMessage, created_at: DateTime<Utc>) -> Result<Message, StoreError> {
    // Stored with fixed microsecond width so text order is time order
    let created_at = created_at.trunc_subsecs(6);
    let id = uuid::Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO messages (id, sender, recipient, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id,
            message.sender.as_str(),
            message.recipient.as_str(),
            message.content,
            format_timestamp(created_at),
        ],
    )?;
    let seq = to_seq(conn.last_insert_rowid())?;

    Ok(Message {
        id,
        seq,
        sender: message.sender,
        recipient: message.recipient,
        content: message.content,
        created_at,
    })
}

fn select(conn: &Connection, filter: &MessageFilter, order: SortOrder) -> Result<Vec<Message>, StoreError> {
    let (predicate, args): (&str, Vec<&str>) = match filter {
        MessageFilter::Involving(x) => ("sender = ?1 OR recipient = ?1", vec![x.as_str()]),
        MessageFilter::Between(x, y) => (
            "(sender = ?1 AND recipient = ?2) OR (sender = ?2 AND recipient = ?1)",
            vec![x.as_str(), y.as_str()],
        ),
    };
    let sql = format!(
        "SELECT seq, id, sender, recipient, content, created_at FROM messages
         WHERE {predicate}
         ORDER BY created_at {dir}, seq {dir}",
        predicate = predicate,
        dir = order.as_sql(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args), |row| {
        Ok(MessageRow {
            seq: row.get(0)?,
            id: row.get(1)?,
            sender: row.get(2)?,
            recipient: row.get(3)?,
            content: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(row?.into_message()?);
    }
    Ok(messages)
}

impl MessageRow {
    fn into_message(self) -> Result<Message, StoreError> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            StoreError::Corrupt(format!("message {} has bad {}: {}", self.id, field, e))
        };

        let sender = Identity::new(self.sender.clone()).map_err(|e| corrupt("sender", &e))?;
        let recipient = Identity::new(self.recipient.clone()).map_err(|e| corrupt("recipient", &e))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt("created_at", &e))?
            .with_timezone(&Utc);
        let seq = to_seq(self.seq)?;

        Ok(Message {
            id: self.id,
            seq,
            sender,
            recipient,
            content: self.content,
            created_at,
        })
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_seq(rowid: i64) -> Result<u64, StoreError> {
    u64::try_from(rowid).map_err(|_| StoreError::Corrupt(format!("negative sequence {}", rowid)))
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn append(&self, message: NewMessage) -> Result<Message, StoreError> {
        let created_at = (self.clock)();
        self.with_connection(move |conn| insert(conn, message, created_at)).await
    }

    async fn query(&self, filter: &MessageFilter, order: SortOrder) -> Result<Vec<Message>, StoreError> {
        let filter = filter.clone();
        self.with_connection(move |conn| select(conn, &filter, order)).await
    }
}
