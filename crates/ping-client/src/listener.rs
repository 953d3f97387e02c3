//! Read-receipt listener.
//!
//! Keeps exactly one change-feed subscription per signed-in sender and
//! folds read receipts into the [`PingCache`]. When the connection drops it
//! reconnects with backoff and, on every successful open, asks the
//! dispatcher for the status of cached pings still marked `sent`, so
//! receipts emitted while disconnected are not lost.

use std::sync::Mutex;

use futures::StreamExt;
use ping_core::{NotificationId, PingStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::DispatcherClient;
use crate::cache::PingCache;
use crate::config::{Identity, ReconnectConfig};
use crate::error::Result;
use crate::feed::{ChangeStream, FeedEvent};

/// Subscription state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Never started, or stopped.
    Closed,
    /// Connecting.
    Subscribing,
    /// Connected; receipts are being delivered.
    Subscribed,
    /// Waiting before reconnect attempt `n`.
    Reconnecting(u32),
    /// Gave up after exhausting the retry budget.
    Failed,
}

struct Running {
    user_id: i64,
    handle: JoinHandle<()>,
}

/// Service object owning the change-feed subscription.
pub struct ReadReceiptListener {
    api: DispatcherClient,
    sse: reqwest::Client,
    cache: PingCache,
    reconnect: ReconnectConfig,
    running: Mutex<Option<Running>>,
    status: watch::Sender<FeedStatus>,
}

impl ReadReceiptListener {
    pub fn new(api: DispatcherClient, cache: PingCache, reconnect: ReconnectConfig) -> Result<Self> {
        // Separate client without a timeout; the feed connection is long-lived
        let sse = reqwest::Client::builder().build()?;
        let (status, _) = watch::channel(FeedStatus::Closed);

        Ok(Self {
            api,
            sse,
            cache,
            reconnect,
            running: Mutex::new(None),
            status,
        })
    }

    /// Subscribe to read receipts for `identity`.
    ///
    /// A no-op if already subscribed for the same user. A different user
    /// replaces the current subscription.
    pub fn start(&self, identity: &Identity) {
        let Ok(mut running) = self.running.lock() else {
            return;
        };

        if let Some(current) = running.as_ref() {
            if current.user_id == identity.id && !current.handle.is_finished() {
                debug!(user_id = identity.id, "Read-receipt listener already running");
                return;
            }
        }
        if let Some(previous) = running.take() {
            info!(user_id = previous.user_id, "Closing read-receipt subscription");
            previous.handle.abort();
        }

        info!(user_id = identity.id, "Starting read-receipt listener");
        let feed = Feed {
            api: self.api.clone(),
            sse: self.sse.clone(),
            cache: self.cache.clone(),
            reconnect: self.reconnect.clone(),
            identity: identity.clone(),
            status: self.status.clone(),
        };
        self.status.send_replace(FeedStatus::Subscribing);
        *running = Some(Running {
            user_id: identity.id,
            handle: tokio::spawn(feed.run()),
        });
    }

    /// Close the subscription. A no-op when not running.
    pub fn stop(&self) {
        if let Ok(mut running) = self.running.lock() {
            if let Some(current) = running.take() {
                info!(user_id = current.user_id, "Stopping read-receipt listener");
                current.handle.abort();
                self.status.send_replace(FeedStatus::Closed);
            }
        }
    }

    /// User the listener is subscribed for, if running.
    pub fn user_id(&self) -> Option<i64> {
        self.running
            .lock()
            .ok()
            .and_then(|r| r.as_ref().filter(|r| !r.handle.is_finished()).map(|r| r.user_id))
    }

    /// Watch the subscription state.
    pub fn status(&self) -> watch::Receiver<FeedStatus> {
        self.status.subscribe()
    }
}

impl Drop for ReadReceiptListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State moved into the subscription task.
struct Feed {
    api: DispatcherClient,
    sse: reqwest::Client,
    cache: PingCache,
    reconnect: ReconnectConfig,
    identity: Identity,
    status: watch::Sender<FeedStatus>,
}

impl Feed {
    async fn run(self) {
        let url = match self.api.changes_url(&self.identity) {
            Ok(url) => url,
            Err(e) => {
                error!(user_id = self.identity.id, "Cannot subscribe to read receipts: {}", e);
                self.status.send_replace(FeedStatus::Failed);
                return;
            }
        };
        let mut attempt: u32 = 0;

        loop {
            self.status.send_replace(FeedStatus::Subscribing);

            match ChangeStream::connect(&self.sse, url.as_str()) {
                Ok(mut stream) => {
                    while let Some(item) = stream.next().await {
                        match item {
                            Ok(FeedEvent::Opened) => {
                                attempt = 0;
                                self.status.send_replace(FeedStatus::Subscribed);
                                info!(user_id = self.identity.id, "Read-receipt feed subscribed");
                                self.backfill().await;
                            }
                            Ok(FeedEvent::Change(event)) => {
                                if event.sender_id() != Some(self.identity.id) {
                                    continue;
                                }
                                if let Some(id) = event.read_receipt() {
                                    self.apply(&id).await;
                                }
                            }
                            Err(e) => {
                                warn!(user_id = self.identity.id, "Read-receipt feed dropped: {}", e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => warn!("Failed to open read-receipt feed: {}", e),
            }

            if !self.reconnect.should_retry(attempt) {
                error!(user_id = self.identity.id, attempts = attempt, "Giving up on read-receipt feed");
                self.status.send_replace(FeedStatus::Failed);
                return;
            }
            let delay = self.reconnect.delay_for_attempt(attempt);
            attempt += 1;
            self.status.send_replace(FeedStatus::Reconnecting(attempt));
            debug!(attempt, delay = ?delay, "Reconnecting read-receipt feed");
            tokio::time::sleep(delay).await;
        }
    }

    async fn apply(&self, id: &NotificationId) {
        match self.cache.update_status(id, PingStatus::Read.as_str()).await {
            Ok(true) => info!(notification_id = %id, "Ping read"),
            Ok(false) => debug!(notification_id = %id, "Read receipt for an uncached ping"),
            Err(e) => error!(notification_id = %id, "Failed to record read receipt: {}", e),
        }
    }

    /// Catch up on receipts emitted while no connection was open.
    async fn backfill(&self) {
        let pending = self.cache.pending_ids();
        if pending.is_empty() {
            return;
        }

        match self.api.ping_status(&self.identity, &pending).await {
            Ok(statuses) => {
                let read: Vec<_> = statuses
                    .into_iter()
                    .filter(|s| s.status == PingStatus::Read)
                    .collect();
                debug!(pending = pending.len(), read = read.len(), "Backfilled read receipts");
                for entry in read {
                    self.apply(&entry.id).await;
                }
            }
            Err(e) => warn!("Read-receipt backfill failed: {}", e),
        }
    }
}
