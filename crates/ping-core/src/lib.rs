//! Core types shared by the ping dispatcher and its clients.
//!
//! This crate provides the vocabulary every other crate in the workspace
//! speaks:
//!
//! - [`Ping`] / [`PingStatus`] - The server-side ping row and its lifecycle
//! - [`NotificationId`] - The canonical string form of a ping id
//! - [`ChangeEvent`] - Row-level mutations published on the change feed
//! - [`PingData`] - The data portion of a ping push message
//! - [`api`] - Request and response bodies of the dispatcher HTTP surface
//!
//! # Example
//!
//! ```rust
//! use ping_core::{tick_mark, NotificationId, PingStatus, TickMark};
//!
//! let id = NotificationId::from(501);
//! assert_eq!(id.as_str(), "501");
//!
//! assert_eq!(tick_mark(PingStatus::Read.as_str()), Some(TickMark::Double));
//! assert_eq!(tick_mark("delivered"), None);
//! ```

pub mod api;
mod change;
mod id;
mod ping;
mod push;
mod status;

pub use change::{feed_channel, ChangeEvent, ChangeKind, ParseChangeKindError, NOTIFICATIONS_TABLE};
pub use id::NotificationId;
pub use ping::Ping;
pub use push::{PingData, PING_MESSAGE_TYPE};
pub use status::{tick_mark, ParseStatusError, PingStatus, TickMark};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
