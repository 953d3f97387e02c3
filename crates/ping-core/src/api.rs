//! Request and response bodies of the dispatcher HTTP surface.
//!
//! Request fields the server validates itself are optional, so a missing
//! field reaches the handler and is answered with the right status code
//! instead of a generic deserialization rejection.

use serde::{Deserialize, Serialize};

use crate::id::NotificationId;
use crate::ping::Ping;
use crate::status::PingStatus;

/// Message used when an individual ping carries none.
pub const DEFAULT_PING_MESSAGE: &str = "Come for meeting";

/// Longest accepted ping message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 200;

/// Most ids accepted in one `POST /ping-status` request.
pub const MAX_STATUS_IDS: usize = 500;

/// Message used when a group ping carries none.
pub fn default_group_message(topic: &str) -> String {
    format!("{} meeting is starting!", topic)
}

/// `POST /send-ping` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendPingRequest {
    #[serde(default)]
    pub sender_id: Option<i64>,
    #[serde(default)]
    pub sender_token: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `POST /send-ping` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendPingResponse {
    pub success: bool,
    pub notification: Ping,
}

/// `POST /mark-read` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub notification_id: Option<NotificationId>,
}

/// Bare `{success: true}` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// `POST /send-group-ping` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupPingRequest {
    #[serde(default)]
    pub sender_token: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `POST /send-group-ping` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPingResponse {
    pub success: bool,
    pub message: String,
}

/// `POST /ping-status` body, used to backfill read receipts after a feed gap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PingStatusRequest {
    #[serde(default)]
    pub sender_id: Option<i64>,
    #[serde(default)]
    pub sender_token: Option<String>,
    #[serde(default)]
    pub notification_ids: Vec<NotificationId>,
}

/// Status of one ping in a [`PingStatusResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingStatusEntry {
    pub id: NotificationId,
    pub status: PingStatus,
}

/// `POST /ping-status` success body.
///
/// Ids that no longer exist (swept, or never owned by the sender) are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingStatusResponse {
    pub success: bool,
    pub statuses: Vec<PingStatusEntry>,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: String,
}

/// Resolve an optional, possibly blank message against a default.
pub fn message_or(message: Option<&str>, default: impl FnOnce() -> String) -> String {
    match message.map(str::trim) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_defaults() {
        assert_eq!(message_or(None, || DEFAULT_PING_MESSAGE.to_string()), "Come for meeting");
        assert_eq!(message_or(Some("  "), || DEFAULT_PING_MESSAGE.to_string()), "Come for meeting");
        assert_eq!(message_or(Some(" Hi "), || DEFAULT_PING_MESSAGE.to_string()), "Hi");
        assert_eq!(
            message_or(None, || default_group_message("hardware")),
            "hardware meeting is starting!"
        );
    }

    #[test]
    fn test_mark_read_accepts_string_or_number() {
        let a: MarkReadRequest = serde_json::from_str(r#"{"notification_id": "501"}"#).unwrap();
        let b: MarkReadRequest = serde_json::from_str(r#"{"notification_id": 501}"#).unwrap();
        assert_eq!(a.notification_id, b.notification_id);

        let missing: MarkReadRequest = serde_json::from_str("{}").unwrap();
        assert!(missing.notification_id.is_none());
    }
}
