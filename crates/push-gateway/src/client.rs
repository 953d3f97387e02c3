//! HTTP client for an FCM v1 style push provider.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::PushGateway;
use crate::types::{PushMessage, SendReceipt, Target};

/// Request envelope expected by the send endpoint.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: &'a PushMessage,
}

/// Client for the push provider's HTTP API.
#[derive(Clone)]
pub struct PushClient {
    http: Client,
    config: GatewayConfig,
    sent: Arc<AtomicU64>,
}

impl PushClient {
    /// Create a client for the configured provider.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        if config.project_id.trim().is_empty() {
            return Err(GatewayError::Config("project id is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(GatewayError::Http)?;

        info!("Push gateway configured for {}", config.send_url());

        Ok(Self {
            http,
            config,
            sent: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Number of messages the provider has accepted through this client.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl PushGateway for PushClient {
    async fn send(&self, message: PushMessage) -> Result<SendReceipt, GatewayError> {
        let url = self.config.send_url();
        match &message.target {
            Target::Token(_) => debug!("Sending push to device token"),
            Target::Topic(topic) => debug!(topic = %topic, "Sending push to topic"),
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&SendRequest { message: &message })
            .send()
            .await
            .map_err(GatewayError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(GatewayError::Http)?;
        let receipt: SendReceipt = serde_json::from_str(&body)?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        debug!(name = %receipt.name, "Push accepted");

        Ok(receipt)
    }

    fn name(&self) -> &str {
        "PushClient"
    }
}

impl std::fmt::Debug for PushClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushClient")
            .field("config", &self.config)
            .field("sent", &self.sent_count())
            .finish()
    }
}
