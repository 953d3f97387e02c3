//! HTTP client for the dispatcher.

use std::time::Duration;

use ping_core::api::{
    ErrorBody, GroupPingRequest, GroupPingResponse, MarkReadRequest, PingStatusEntry,
    PingStatusRequest, PingStatusResponse, SendPingRequest, SendPingResponse, SuccessResponse,
    MAX_STATUS_IDS,
};
use ping_core::{feed_channel, NotificationId, Ping};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{ClientConfig, Identity};
use crate::error::{ClientError, Result};

/// Client for the dispatcher's JSON endpoints.
#[derive(Debug, Clone)]
pub struct DispatcherClient {
    http: Client,
    base_url: String,
}

impl DispatcherClient {
    /// Create a client for the dispatcher named in `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
        })
    }

    /// Base URL of the dispatcher.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a ping to one recipient; returns the stored row.
    pub async fn send_ping(
        &self,
        sender: &Identity,
        recipient_id: i64,
        message: Option<&str>,
    ) -> Result<Ping> {
        let body = SendPingRequest {
            sender_id: Some(sender.id),
            sender_token: Some(sender.token.clone()),
            recipient_id: Some(recipient_id),
            message: message.map(str::to_string),
        };
        let response: SendPingResponse = self.post("/send-ping", &body).await?;
        debug!(notification_id = response.notification.id, "Ping accepted");
        Ok(response.notification)
    }

    /// Mark a ping as read.
    pub async fn mark_read(&self, id: &NotificationId) -> Result<()> {
        let body = MarkReadRequest {
            notification_id: Some(id.clone()),
        };
        let _: SuccessResponse = self.post("/mark-read", &body).await?;
        Ok(())
    }

    /// Broadcast a ping to a topic; returns the dispatcher's confirmation.
    pub async fn send_group_ping(
        &self,
        sender: &Identity,
        topic: &str,
        message: Option<&str>,
    ) -> Result<String> {
        let body = GroupPingRequest {
            sender_token: Some(sender.token.clone()),
            topic: Some(topic.to_string()),
            message: message.map(str::to_string),
        };
        let response: GroupPingResponse = self.post("/send-group-ping", &body).await?;
        Ok(response.message)
    }

    /// Current status of pings the sender sent.
    ///
    /// Ids the dispatcher no longer knows are absent from the result. Large
    /// id lists are split across several requests.
    pub async fn ping_status(
        &self,
        sender: &Identity,
        ids: &[NotificationId],
    ) -> Result<Vec<PingStatusEntry>> {
        let mut statuses = Vec::with_capacity(ids.len());
        for batch in ids.chunks(MAX_STATUS_IDS) {
            let body = PingStatusRequest {
                sender_id: Some(sender.id),
                sender_token: Some(sender.token.clone()),
                notification_ids: batch.to_vec(),
            };
            let response: PingStatusResponse = self.post("/ping-status", &body).await?;
            statuses.extend(response.statuses);
        }
        Ok(statuses)
    }

    /// URL of the read-receipt change feed for a sender.
    pub fn changes_url(&self, sender: &Identity) -> Result<Url> {
        let sender_id = sender.id.to_string();
        let channel = feed_channel(sender.id);
        Url::parse_with_params(
            &format!("{}/changes", self.base_url),
            [
                ("sender_id", sender_id.as_str()),
                ("sender_token", sender.token.as_str()),
                ("event", "UPDATE"),
                ("channel", channel.as_str()),
            ],
        )
        .map_err(|e| ClientError::Feed(format!("invalid change feed URL: {}", e)))
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.http.post(&url).json(body).send().await?;
        let response = check(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Turn a non-success response into [`ClientError::Rejected`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let error = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    Err(ClientError::Rejected {
        status: status.as_u16(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_url() {
        let client = DispatcherClient::new(&ClientConfig::new("http://localhost:3000/")).unwrap();
        let url = client.changes_url(&Identity::new(7, "Asha", "tok en/1")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/changes?sender_id=7&sender_token=tok+en%2F1&event=UPDATE&channel=ping-reads-7"
        );
    }

    #[tokio::test]
    async fn test_unreachable_dispatcher_is_network_error() {
        let client = DispatcherClient::new(&ClientConfig::new("http://127.0.0.1:1")).unwrap();
        let result = client.mark_read(&NotificationId::from(1)).await;
        assert!(matches!(result, Err(ClientError::Network(_))));
    }
}
