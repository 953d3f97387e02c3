//! Sender-side client for the ping tracker.
//!
//! This crate sends pings through the dispatcher, keeps a durable list of
//! the pings the current user sent, and listens on the dispatcher's change
//! feed to flip those pings from a single to a double tick once the
//! recipient reads them. It also contains the recipient-side notification
//! presenter that reports "Mark as Read" back to the dispatcher.
//!
//! # Example
//!
//! ```no_run
//! use ping_client::{ClientConfig, Identity, PingSession, Recipient};
//!
//! # async fn example() -> Result<(), ping_client::ClientError> {
//! let config = ClientConfig::new("http://127.0.0.1:3000");
//! let session = PingSession::open(&config, Identity::new(1, "Asha", "abc")).await?;
//!
//! // Listen for read receipts
//! session.start();
//!
//! let record = session.send_ping(&Recipient::new(2, "Ravi"), Some("Hi")).await?;
//! println!("Sent ping {}", record.notification_id);
//!
//! for ping in session.pings() {
//!     let tick = ping.tick().map(|t| t.glyph()).unwrap_or("");
//!     println!("{} {} {}", ping.recipient_name, ping.message, tick);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod listener;
pub mod presenter;
pub mod record;
pub mod session;
pub mod storage;

pub use api::DispatcherClient;
pub use cache::{PingCache, SENT_PINGS_KEY};
pub use config::{ClientConfig, Identity, ReconnectConfig};
pub use error::{ClientError, Result};
pub use feed::{ChangeStream, FeedEvent};
pub use listener::{FeedStatus, ReadReceiptListener};
pub use presenter::{
    IncomingPush, Interaction, LocalNotification, NotificationPresenter, NotificationSurface,
    PresenterEvent,
};
pub use record::ClientPingRecord;
pub use session::{PingSession, Recipient};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

/// Re-export the shared wire types.
pub use ping_core::{tick_mark, NotificationId, PingStatus, TickMark};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
