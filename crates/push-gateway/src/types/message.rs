//! Types for sending messages via the push provider.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Where a message is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// A single device, by push token.
    Token(String),
    /// Every device subscribed to a topic.
    Topic(String),
}

/// Visible title and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// A message handed to the push provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Recipient device or topic.
    #[serde(flatten)]
    pub target: Target,

    /// Visible part of the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,

    /// String key/value payload delivered to the app.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,

    /// Android-specific delivery options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,

    /// APNs-specific delivery options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,
}

impl PushMessage {
    /// Create a visible message for one device.
    pub fn to_token(
        token: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(Target::Token(token.into()), title, body)
    }

    /// Create a visible message for every subscriber of a topic.
    pub fn to_topic(
        topic: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(Target::Topic(topic.into()), title, body)
    }

    fn new(target: Target, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            target,
            notification: Some(Notification {
                title: title.into(),
                body: body.into(),
            }),
            data: HashMap::new(),
            android: None,
            apns: None,
        }
    }

    /// Attach a data payload.
    pub fn with_data(mut self, data: HashMap<String, String>) -> Self {
        self.data = data;
        self
    }

    /// Route the message to an Android notification channel.
    pub fn with_android_channel(
        mut self,
        channel_id: impl Into<String>,
        click_action: impl Into<String>,
    ) -> Self {
        self.android = Some(AndroidConfig {
            notification: AndroidNotification {
                channel_id: channel_id.into(),
                click_action: Some(click_action.into()),
            },
        });
        self
    }

    /// Set the APNs category that carries the iOS action buttons.
    pub fn with_apns_category(mut self, category: impl Into<String>) -> Self {
        self.apns = Some(ApnsConfig {
            payload: ApnsPayload {
                aps: Aps {
                    category: category.into(),
                },
            },
        });
        self
    }

    /// Whether this message is a topic broadcast.
    pub fn is_broadcast(&self) -> bool {
        matches!(self.target, Target::Topic(_))
    }
}

/// Android delivery options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
}

/// Android notification options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidNotification {
    /// Notification channel on the device.
    pub channel_id: String,
    /// Action fired when the notification is tapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,
}

/// APNs delivery options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

/// APNs payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

/// The `aps` dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aps {
    /// Category registered by the app for its action buttons.
    pub category: String,
}

/// Result of sending a message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendReceipt {
    /// Provider-assigned message name (e.g., "projects/p/messages/123").
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_message_shape() {
        let message = PushMessage::to_token("tok", "New Ping!", "Asha: Hi")
            .with_data(HashMap::from([("type".to_string(), "ping".to_string())]))
            .with_android_channel("default", "FLUTTER_NOTIFICATION_CLICK")
            .with_apns_category("PING_CATEGORY");

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["token"], "tok");
        assert!(json.get("topic").is_none());
        assert_eq!(json["notification"]["title"], "New Ping!");
        assert_eq!(json["data"]["type"], "ping");
        assert_eq!(json["android"]["notification"]["channel_id"], "default");
        assert_eq!(json["apns"]["payload"]["aps"]["category"], "PING_CATEGORY");
        assert!(!message.is_broadcast());
    }

    #[test]
    fn test_topic_message_omits_empty_parts() {
        let message = PushMessage::to_topic("hardware", "Group Ping", "hardware meeting is starting!");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["topic"], "hardware");
        assert!(json.get("data").is_none());
        assert!(json.get("android").is_none());
        assert!(message.is_broadcast());
    }
}
