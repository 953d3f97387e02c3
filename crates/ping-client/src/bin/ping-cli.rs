//! Command-line front end for the ping client.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ping_client::{
    ClientConfig, ClientPingRecord, DispatcherClient, FeedStatus, FileStore, Identity,
    KeyValueStore, NotificationId, PingCache, PingSession, Recipient, SENT_PINGS_KEY,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ping-cli")]
#[command(about = "Send pings and watch their read receipts")]
struct Args {
    /// Dispatcher URL. Falls back to PING_API_URL env.
    #[arg(long)]
    api_url: Option<String>,

    /// Directory holding the sent-ping cache. Falls back to PING_STORAGE_DIR env.
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Args)]
struct SenderArgs {
    /// Your user id
    #[arg(long)]
    sender_id: i64,

    /// Your display name
    #[arg(long, default_value = "me")]
    sender_name: String,

    /// Your push token
    #[arg(long)]
    token: String,
}

impl SenderArgs {
    fn identity(&self) -> Identity {
        Identity::new(self.sender_id, &self.sender_name, &self.token)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a ping to one member
    Send {
        #[command(flatten)]
        sender: SenderArgs,

        /// Recipient user id
        #[arg(long)]
        recipient_id: i64,

        /// Recipient display name, as stored in the cache
        #[arg(long)]
        recipient_name: String,

        /// Message (defaults to "Ping from <name>")
        #[arg(long)]
        message: Option<String>,
    },
    /// Broadcast a ping to a topic
    Group {
        #[command(flatten)]
        sender: SenderArgs,

        /// Topic, usually a domain
        #[arg(long)]
        topic: String,

        /// Message (defaults to "<topic> meeting is starting!")
        #[arg(long)]
        message: Option<String>,
    },
    /// Mark a received ping as read
    MarkRead {
        /// Notification id from the push payload
        notification_id: String,
    },
    /// Show cached sent pings with their ticks
    List,
    /// Forget every cached sent ping
    Clear,
    /// Listen for read receipts until interrupted
    Watch {
        #[command(flatten)]
        sender: SenderArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = args.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = args.storage_dir {
        config = config.with_storage_dir(dir);
    }

    match args.command {
        Command::Send {
            sender,
            recipient_id,
            recipient_name,
            message,
        } => {
            let session = PingSession::open(&config, sender.identity()).await?;
            let record = session
                .send_ping(&Recipient::new(recipient_id, recipient_name), message.as_deref())
                .await?;
            println!(
                "Ping {} sent to {}: {}",
                record.notification_id, record.recipient_name, record.message
            );
        }
        Command::Group {
            sender,
            topic,
            message,
        } => {
            let session = PingSession::open(&config, sender.identity()).await?;
            let confirmation = session.send_group_ping(&topic, message.as_deref()).await?;
            println!("{}", confirmation);
        }
        Command::MarkRead { notification_id } => {
            let api = DispatcherClient::new(&config)?;
            api.mark_read(&NotificationId::new(notification_id)).await?;
            println!("Marked as read");
        }
        Command::List => {
            let cache = PingCache::open(Arc::new(FileStore::new(&config.storage_dir))).await?;
            print_pings(&cache.snapshot());
        }
        Command::Clear => {
            // Removed without decoding, so a damaged cache can always be reset
            FileStore::new(&config.storage_dir)
                .remove(SENT_PINGS_KEY)
                .await?;
            println!("Cleared");
        }
        Command::Watch { sender } => {
            let session = PingSession::open(&config, sender.identity()).await?;
            let mut pings = session.cache().subscribe();
            let mut status = session.listener().status();
            session.start();
            print_pings(&session.pings());

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = pings.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        print_pings(&session.pings());
                    }
                    changed = status.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let current = *status.borrow();
                        eprintln!("feed: {:?}", current);
                        if current == FeedStatus::Failed {
                            break;
                        }
                    }
                }
            }
            session.stop();
        }
    }

    Ok(())
}

fn print_pings(pings: &[ClientPingRecord]) {
    if pings.is_empty() {
        println!("No pings sent yet");
        return;
    }
    for ping in pings {
        let tick = ping.tick().map(|t| t.glyph()).unwrap_or("");
        println!(
            "{:>6}  {:<16} {:<32} {:<24} {}",
            ping.notification_id.as_str(),
            ping.recipient_name,
            ping.message,
            ping.timestamp,
            tick
        );
    }
}
