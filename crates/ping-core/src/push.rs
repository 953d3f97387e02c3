//! The data portion of a ping push message.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::NotificationId;
use crate::ping::Ping;

/// `type` discriminator carried by individual ping pushes.
pub const PING_MESSAGE_TYPE: &str = "ping";

/// Data payload delivered to the recipient's device with a ping.
///
/// Push providers only carry string-to-string maps, so every field is a
/// string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingData {
    /// Ping id the "mark read" action reports back.
    pub notification_id: NotificationId,
    /// Sender's user id.
    pub sender_id: String,
    /// Message text.
    pub message: String,
    /// Always [`PING_MESSAGE_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
}

impl PingData {
    /// Build the payload for a stored ping.
    pub fn for_ping(ping: &Ping) -> Self {
        Self {
            notification_id: ping.notification_id(),
            sender_id: ping.sender_id.to_string(),
            message: ping.message.clone(),
            kind: PING_MESSAGE_TYPE.to_string(),
        }
    }

    /// Flatten into the string map a push provider accepts.
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            ("notification_id".to_string(), self.notification_id.to_string()),
            ("sender_id".to_string(), self.sender_id.clone()),
            ("message".to_string(), self.message.clone()),
            ("type".to_string(), self.kind.clone()),
        ])
    }

    /// Read a ping payload back out of a push data map.
    ///
    /// Returns `None` for maps that are not ping payloads or carry no id.
    pub fn from_map(data: &HashMap<String, String>) -> Option<Self> {
        if data.get("type").map(String::as_str) != Some(PING_MESSAGE_TYPE) {
            return None;
        }
        let notification_id = NotificationId::new(data.get("notification_id")?);
        if notification_id.is_empty() {
            return None;
        }
        Some(Self {
            notification_id,
            sender_id: data.get("sender_id").cloned().unwrap_or_default(),
            message: data.get("message").cloned().unwrap_or_default(),
            kind: PING_MESSAGE_TYPE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::PingStatus;

    #[test]
    fn test_payload_for_ping() {
        let ping = Ping {
            id: 501,
            sender_id: 1,
            recipient_id: 2,
            message: "Hi".to_string(),
            status: PingStatus::Sent,
            created_at: "2026-01-01 10:00:00".to_string(),
        };
        let data = PingData::for_ping(&ping).to_map();
        assert_eq!(data["notification_id"], "501");
        assert_eq!(data["sender_id"], "1");
        assert_eq!(data["message"], "Hi");
        assert_eq!(data["type"], "ping");
    }

    #[test]
    fn test_from_map_requires_ping_type_and_id() {
        let mut data = HashMap::from([
            ("notification_id".to_string(), "501".to_string()),
            ("type".to_string(), "ping".to_string()),
        ]);
        let parsed = PingData::from_map(&data).unwrap();
        assert_eq!(parsed.notification_id, NotificationId::from(501));
        assert_eq!(parsed.message, "");

        data.insert("type".to_string(), "group".to_string());
        assert!(PingData::from_map(&data).is_none());

        let no_id = HashMap::from([("type".to_string(), "ping".to_string())]);
        assert!(PingData::from_map(&no_id).is_none());
    }
}
