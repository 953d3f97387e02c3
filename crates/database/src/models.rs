//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use ping_core::{Ping, PingStatus};

/// A member of the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Numeric user id.
    pub id: i64,
    /// Display name
    pub name: String,
    /// Domain (e.g., "software", "hardware"); doubles as the group-ping topic.
    pub domain: String,
    /// Current push token of the user's device. Also the sender credential.
    pub push_token: Option<String>,
}

impl User {
    /// Create a user without a push token.
    pub fn new(id: i64, name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            domain: domain.into(),
            push_token: None,
        }
    }

    /// Set the push token.
    pub fn with_push_token(mut self, token: impl Into<String>) -> Self {
        self.push_token = Some(token.into());
        self
    }
}
