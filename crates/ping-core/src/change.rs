//! Row-level change events published on the change feed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::NotificationId;
use crate::ping::Ping;
use crate::status::PingStatus;

/// Table name carried by every ping change event.
pub const NOTIFICATIONS_TABLE: &str = "notifications";

/// Channel name for a sender's read-receipt subscription.
pub fn feed_channel(user_id: i64) -> String {
    format!("ping-reads-{}", user_id)
}

/// The kind of mutation a change event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    /// Wire form (`INSERT`, `UPDATE`, `DELETE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a change kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown change kind: {0}")]
pub struct ParseChangeKindError(pub String);

impl FromStr for ChangeKind {
    type Err = ParseChangeKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Ok(ChangeKind::Insert),
            "UPDATE" => Ok(ChangeKind::Update),
            "DELETE" => Ok(ChangeKind::Delete),
            _ => Err(ParseChangeKindError(s.to_string())),
        }
    }
}

/// A mutation of one `notifications` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Subscription channel the event was delivered on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Mutation kind.
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Table the row belongs to.
    pub table: String,
    /// Row after the mutation (absent for deletes).
    #[serde(default)]
    pub new: Option<Ping>,
    /// Row before the mutation (absent for inserts).
    #[serde(default)]
    pub old: Option<Ping>,
}

impl ChangeEvent {
    /// An insert of `ping`.
    pub fn insert(ping: Ping) -> Self {
        Self {
            channel: None,
            kind: ChangeKind::Insert,
            table: NOTIFICATIONS_TABLE.to_string(),
            new: Some(ping),
            old: None,
        }
    }

    /// An update from `old` to `new`.
    pub fn update(old: Ping, new: Ping) -> Self {
        Self {
            channel: None,
            kind: ChangeKind::Update,
            table: NOTIFICATIONS_TABLE.to_string(),
            new: Some(new),
            old: Some(old),
        }
    }

    /// A delete of `ping`.
    pub fn delete(ping: Ping) -> Self {
        Self {
            channel: None,
            kind: ChangeKind::Delete,
            table: NOTIFICATIONS_TABLE.to_string(),
            new: None,
            old: Some(ping),
        }
    }

    /// Tag the event with the channel it is delivered on.
    pub fn on_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Sender of the affected row.
    pub fn sender_id(&self) -> Option<i64> {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .map(|ping| ping.sender_id)
    }

    /// Whether the event matches a sender-scoped subscription filter.
    pub fn matches(&self, sender_id: i64, kind: Option<ChangeKind>) -> bool {
        self.table == NOTIFICATIONS_TABLE
            && self.sender_id() == Some(sender_id)
            && kind.map_or(true, |k| k == self.kind)
    }

    /// The id of the ping this event reports as read, if any.
    pub fn read_receipt(&self) -> Option<NotificationId> {
        if self.kind != ChangeKind::Update {
            return None;
        }
        self.new
            .as_ref()
            .filter(|ping| ping.status == PingStatus::Read)
            .map(Ping::notification_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(id: i64, sender_id: i64, status: PingStatus) -> Ping {
        Ping {
            id,
            sender_id,
            recipient_id: 2,
            message: "Hi".to_string(),
            status,
            created_at: "2026-01-01 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_feed_channel() {
        assert_eq!(feed_channel(1), "ping-reads-1");
    }

    #[test]
    fn test_read_receipt_only_for_updates_to_read() {
        let update = ChangeEvent::update(ping(501, 1, PingStatus::Sent), ping(501, 1, PingStatus::Read));
        assert_eq!(update.read_receipt(), Some(NotificationId::from(501)));

        let insert = ChangeEvent::insert(ping(502, 1, PingStatus::Sent));
        assert_eq!(insert.read_receipt(), None);

        let delete = ChangeEvent::delete(ping(501, 1, PingStatus::Read));
        assert_eq!(delete.read_receipt(), None);
    }

    #[test]
    fn test_matches_filters_sender_and_kind() {
        let event = ChangeEvent::update(ping(1, 7, PingStatus::Sent), ping(1, 7, PingStatus::Read));
        assert!(event.matches(7, Some(ChangeKind::Update)));
        assert!(event.matches(7, None));
        assert!(!event.matches(8, Some(ChangeKind::Update)));
        assert!(!event.matches(7, Some(ChangeKind::Insert)));
    }

    #[test]
    fn test_wire_shape() {
        let event = ChangeEvent::update(ping(501, 1, PingStatus::Sent), ping(501, 1, PingStatus::Read))
            .on_channel(feed_channel(1));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "UPDATE");
        assert_eq!(json["table"], "notifications");
        assert_eq!(json["channel"], "ping-reads-1");
        assert_eq!(json["new"]["status"], "read");
        assert_eq!(json["new"]["id"], 501);
    }

    #[test]
    fn test_kind_parses_case_insensitively() {
        assert_eq!("update".parse::<ChangeKind>().unwrap(), ChangeKind::Update);
        assert!("upsert".parse::<ChangeKind>().is_err());
    }
}
