use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use blinkchat::infrastructure::adapters::ConsoleRenderer;
use blinkchat::{
    AppError, ChatView, Config, Identity, InMemoryStore, InboxView, MessageStore, MessagingService,
    PollerConfig, SqliteStore,
};

type Service = MessagingService<Arc<dyn MessageStore>>;

#[derive(Parser)]
#[command(name = "blinkchat")]
#[command(about = "Direct messages between email identities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "blinkchat.yaml")]
    config: String,

    /// Message database (overrides config)
    #[arg(long)]
    db: Option<String>,

    /// Your identity (overrides config)
    #[arg(long)]
    me: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message
    Send {
        /// Recipient email
        to: String,
        /// Message text
        content: String,
    },
    /// Print a conversation, oldest first
    Messages {
        /// Counterpart email
        with: String,
        #[arg(long)]
        json: bool,
    },
    /// Print one line per conversation
    Conversations {
        #[arg(long)]
        json: bool,
    },
    /// Open a live conversation; lines typed on stdin are sent
    Chat {
        /// Counterpart email
        with: String,
    },
    /// Watch the conversation list
    Inbox,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Version => {
            println!("blinkchat v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(&cli.config),
        _ => run(cli),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn init_config(path: &str) -> Result<(), AppError> {
    if Path::new(path).exists() {
        tracing::warn!("{} already exists, leaving it untouched", path);
        return Ok(());
    }
    std::fs::write(path, Config::default().to_yaml()?)?;
    println!("Wrote default config to {}", path);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = if Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    config.apply_env();

    if let Some(db) = &cli.db {
        config.store.path = db.into();
    }
    if let Some(me) = &cli.me {
        config.identity = Some(me.clone());
    }
    Ok(config)
}

fn open_store(config: &Config) -> Result<Arc<dyn MessageStore>, AppError> {
    if config.store.in_memory {
        tracing::info!("Using in-memory message store");
        return Ok(Arc::new(InMemoryStore::new()));
    }
    Ok(Arc::new(SqliteStore::open(&config.store.path)?))
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli)?;
    let me = Identity::parse_email(config.identity.clone().unwrap_or_default())?;
    let service = Arc::new(MessagingService::new(open_store(&config)?));
    let poller = PollerConfig::from(&config.polling);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        match cli.command {
            Commands::Send { to, content } => {
                let to = Identity::parse_email(to)?;
                let message = service.send_message(&me, &to, &content).await?;
                tracing::info!("Sent message {} to {}", message.id, to);
                Ok(())
            }
            Commands::Messages { with, json } => {
                let with = Identity::parse_email(with)?;
                let messages = service.get_conversation_messages(&me, &with).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&messages)?);
                } else {
                    let renderer = ConsoleRenderer::new(me);
                    for message in &messages {
                        println!("{}", renderer.message(message));
                    }
                }
                Ok(())
            }
            Commands::Conversations { json } => {
                let conversations = service.get_conversations(&me).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&conversations)?);
                } else {
                    let renderer = ConsoleRenderer::new(me);
                    let now = chrono::Utc::now();
                    for conversation in &conversations {
                        println!("{}", renderer.conversation(conversation, now));
                    }
                }
                Ok(())
            }
            Commands::Chat { with } => {
                let with = Identity::parse_email(with)?;
                run_chat(service, me, with, poller).await
            }
            Commands::Inbox => run_inbox(service, me, poller).await,
            Commands::Version | Commands::InitConfig => Ok(()),
        }
    })
}

async fn run_chat(service: Arc<Service>, me: Identity, with: Identity, poller: PollerConfig) -> Result<(), AppError> {
    let renderer = ConsoleRenderer::new(me.clone());
    let view = ChatView::open(service, me, with.clone(), poller);
    let mut updates = view.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_seq: Option<u64> = None;

    println!("Chatting with {} (type /quit to leave)", with);

    let result = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = updates.borrow_and_update().clone();
                let Some(messages) = current else { continue };
                let since = last_seq;
                for message in messages.iter().filter(|m| since.map_or(true, |seq| m.seq > seq)) {
                    println!("{}", renderer.message(message));
                    last_seq = Some(last_seq.map_or(message.seq, |seq| seq.max(message.seq)));
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(AppError::Io(e)),
                };
                if line.trim() == "/quit" {
                    break Ok(());
                }
                // No retry; the next poll shows whether it landed
                if let Err(e) = view.send(&line).await {
                    tracing::warn!("Failed to send message: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    view.close().await;
    result
}

async fn run_inbox(service: Arc<Service>, me: Identity, poller: PollerConfig) -> Result<(), AppError> {
    let renderer = ConsoleRenderer::new(me.clone());
    let inbox = InboxView::open(service, me, poller);
    let mut updates = inbox.subscribe();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = updates.borrow_and_update().clone();
                let Some(conversations) = current else { continue };
                let now = chrono::Utc::now();
                println!("--- {} conversations ---", conversations.len());
                for conversation in conversations.iter() {
                    println!("{}", renderer.conversation(conversation, now));
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    inbox.close().await;
    Ok(())
}
