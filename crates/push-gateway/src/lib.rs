//! Push-notification gateway for the ping tracker.
//!
//! This crate provides the [`PushGateway`] abstraction the dispatcher
//! delivers through, and an HTTP client for an FCM v1 style provider. It
//! supports:
//!
//! - Sending a message to a single device token
//! - Broadcasting a message to every device subscribed to a topic
//!
//! Delivery is best-effort: a successful send means the provider accepted
//! the message, not that a device displayed it.
//!
//! # Example
//!
//! ```no_run
//! use push_gateway::{GatewayConfig, PushClient, PushGateway, PushMessage};
//!
//! # async fn example() -> Result<(), push_gateway::GatewayError> {
//! let config = GatewayConfig::fcm("my-project", "ya29.token");
//! let client = PushClient::new(config)?;
//!
//! // Send to one device
//! let message = PushMessage::to_token("device-token", "New Ping!", "Asha: Hi");
//! let receipt = client.send(message).await?;
//! println!("Accepted as {}", receipt.name);
//!
//! // Broadcast to a topic
//! client.send(PushMessage::to_topic("hardware", "Group Ping", "hardware meeting is starting!")).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

pub use client::PushClient;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::PushGateway;
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
