//! Route handlers for the ping dispatcher.

pub mod changes;
pub mod group;
pub mod health;
pub mod ping;
pub mod status;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Pings
        .route("/send-ping", post(ping::send_ping))
        .route("/mark-read", post(ping::mark_read))
        .route("/send-group-ping", post(group::send_group_ping))
        // Read-receipt reconciliation
        .route("/ping-status", post(status::ping_status))
        .route("/changes", get(changes::changes))
        // Health check
        .route("/health", get(health::health))
}
