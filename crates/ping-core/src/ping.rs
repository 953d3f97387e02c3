//! The server-side ping row.

use serde::{Deserialize, Serialize};

use crate::id::NotificationId;
use crate::status::PingStatus;

/// A directed ping from one user to another (table `notifications`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Ping {
    /// Generated row id.
    pub id: i64,
    /// User who sent the ping.
    pub sender_id: i64,
    /// User the ping was addressed to.
    pub recipient_id: i64,
    /// Message text.
    pub message: String,
    /// Lifecycle status.
    pub status: PingStatus,
    /// Creation timestamp (UTC, `YYYY-MM-DD HH:MM:SS`).
    pub created_at: String,
}

impl Ping {
    /// The row id in canonical string form.
    pub fn notification_id(&self) -> NotificationId {
        NotificationId::from(self.id)
    }

    /// Whether the recipient has read the ping.
    pub fn is_read(&self) -> bool {
        self.status == PingStatus::Read
    }
}
