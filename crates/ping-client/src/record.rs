//! Client-side record of a sent ping.

use chrono::Local;
use ping_core::{tick_mark, NotificationId, PingStatus, TickMark};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ping the current user sent, as persisted in the local cache.
///
/// `status` is kept as the raw string so that unrecognized values read
/// from storage survive a rewrite untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPingRecord {
    pub local_id: String,
    pub notification_id: NotificationId,
    pub recipient_name: String,
    pub message: String,
    pub timestamp: String,
    pub status: String,
}

impl ClientPingRecord {
    /// A freshly sent ping.
    pub fn sent(
        notification_id: NotificationId,
        recipient_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            local_id: Uuid::new_v4().to_string(),
            notification_id,
            recipient_name: recipient_name.into(),
            message: message.into(),
            timestamp: Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
            status: PingStatus::Sent.to_string(),
        }
    }

    /// Copy of this record with a different status.
    pub fn with_status(&self, status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..self.clone()
        }
    }

    /// Tick mark to render for this record.
    pub fn tick(&self) -> Option<TickMark> {
        tick_mark(&self.status)
    }

    /// Whether the ping is still waiting for a read receipt.
    pub fn is_pending(&self) -> bool {
        self.status == PingStatus::Sent.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sent_record() {
        let record = ClientPingRecord::sent(NotificationId::from(501), "Ravi", "Hi");
        assert_eq!(record.notification_id, "501");
        assert_eq!(record.status, "sent");
        assert_eq!(record.tick(), Some(TickMark::Single));
        assert!(record.is_pending());
        assert!(!record.local_id.is_empty());
    }

    #[test]
    fn test_unknown_status_has_no_tick() {
        let record = ClientPingRecord::sent(NotificationId::from(1), "Ravi", "Hi").with_status("unknown");
        assert_eq!(record.tick(), None);
        assert!(!record.is_pending());
    }

    #[test]
    fn test_camel_case_layout_and_numeric_ids() {
        let json = r#"{
            "localId": "1735120800000",
            "notificationId": 501,
            "recipientName": "John",
            "message": "Come for meeting",
            "timestamp": "12/25/2024, 10:00:00 AM",
            "status": "read"
        }"#;
        let record: ClientPingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.notification_id, "501");
        assert_eq!(record.tick(), Some(TickMark::Double));

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["notificationId"], "501");
        assert_eq!(out["recipientName"], "John");
    }
}
