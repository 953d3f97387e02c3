//! Ping dispatcher HTTP service.
//!
//! Validates sender identity, stores pings, hands them to the push gateway
//! and streams row changes back to senders so they can show read receipts.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use database::Database;
//! use dispatcher::{app, AppState};
//! use push_gateway::{GatewayConfig, PushClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:pings.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let gateway = PushClient::new(GatewayConfig::fcm("my-project", "ya29.token"))?;
//!     let router = app(AppState::new(db, Arc::new(gateway)));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod sweep;

pub use config::{Config, ConfigError};
pub use error::DispatchError;
pub use state::AppState;
pub use sweep::SweepTask;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the dispatcher application.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
