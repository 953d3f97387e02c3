//! A signed-in sender's session.

use std::sync::Arc;

use tracing::info;

use crate::api::DispatcherClient;
use crate::cache::PingCache;
use crate::config::{ClientConfig, Identity};
use crate::error::Result;
use crate::listener::ReadReceiptListener;
use crate::record::ClientPingRecord;
use crate::storage::{FileStore, KeyValueStore};

/// Who a ping is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub id: i64,
    pub name: String,
}

impl Recipient {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Ties the dispatcher API, the ping cache and the read-receipt listener
/// together for one signed-in user.
pub struct PingSession {
    identity: Identity,
    api: DispatcherClient,
    cache: PingCache,
    listener: ReadReceiptListener,
}

impl PingSession {
    /// Open a session persisting its cache under `config.storage_dir`.
    pub async fn open(config: &ClientConfig, identity: Identity) -> Result<Self> {
        let store = Arc::new(FileStore::new(&config.storage_dir));
        Self::with_store(config, identity, store).await
    }

    /// Open a session over an arbitrary store.
    pub async fn with_store(
        config: &ClientConfig,
        identity: Identity,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let api = DispatcherClient::new(config)?;
        let cache = PingCache::open(store).await?;
        let listener = ReadReceiptListener::new(api.clone(), cache.clone(), config.reconnect.clone())?;

        Ok(Self {
            identity,
            api,
            cache,
            listener,
        })
    }

    /// Start listening for read receipts. Idempotent.
    pub fn start(&self) {
        self.listener.start(&self.identity);
    }

    /// Stop listening for read receipts. Idempotent.
    pub fn stop(&self) {
        self.listener.stop();
    }

    /// Switch to another user, moving the subscription over.
    pub fn switch_identity(&mut self, identity: Identity) {
        info!(from = self.identity.id, to = identity.id, "Switching session user");
        self.identity = identity;
        self.listener.start(&self.identity);
    }

    /// Send a ping and record it in the cache.
    ///
    /// A blank message becomes "Ping from {name}". Nothing is cached unless
    /// the dispatcher accepted the ping.
    pub async fn send_ping(
        &self,
        recipient: &Recipient,
        message: Option<&str>,
    ) -> Result<ClientPingRecord> {
        let message = match message.map(str::trim) {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => format!("Ping from {}", self.identity.name),
        };

        let ping = self
            .api
            .send_ping(&self.identity, recipient.id, Some(&message))
            .await?;

        let record = ClientPingRecord::sent(ping.notification_id(), &recipient.name, message);
        self.cache.append(record.clone()).await?;

        info!(
            notification_id = %record.notification_id,
            recipient = %recipient.name,
            "Ping sent"
        );
        Ok(record)
    }

    /// Broadcast a ping to a topic.
    pub async fn send_group_ping(&self, topic: &str, message: Option<&str>) -> Result<String> {
        self.api.send_group_ping(&self.identity, topic, message).await
    }

    /// Forget every cached ping.
    pub async fn clear_pings(&self) -> Result<()> {
        self.cache.clear_all().await
    }

    /// Cached pings, most recent first.
    pub fn pings(&self) -> Vec<ClientPingRecord> {
        self.cache.snapshot()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn api(&self) -> &DispatcherClient {
        &self.api
    }

    pub fn cache(&self) -> &PingCache {
        &self.cache
    }

    pub fn listener(&self) -> &ReadReceiptListener {
        &self.listener
    }
}
