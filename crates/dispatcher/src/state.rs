//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use push_gateway::PushGateway;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection and change feed.
    pub db: Database,
    /// Push delivery.
    pub gateway: Arc<dyn PushGateway>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, gateway: Arc<dyn PushGateway>) -> Self {
        Self { db, gateway }
    }
}
