//! Durable list of the pings the current user sent.
//!
//! The list is persisted as one JSON array, most recent first, under
//! [`SENT_PINGS_KEY`]. Every read-modify-write runs on a single task fed by
//! a command queue, so an append racing a read receipt can never write over
//! the other's snapshot. Readers get the current list through a watch
//! channel that is updated after each persisted change.

use std::sync::Arc;

use ping_core::NotificationId;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::record::ClientPingRecord;
use crate::storage::KeyValueStore;

/// Storage key of the persisted list.
pub const SENT_PINGS_KEY: &str = "sent_pings";

const QUEUE_CAPACITY: usize = 64;

enum Command {
    Append {
        record: ClientPingRecord,
        reply: oneshot::Sender<Result<()>>,
    },
    UpdateStatus {
        id: NotificationId,
        status: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    ClearAll {
        reply: oneshot::Sender<Result<()>>,
    },
    Reload {
        reply: oneshot::Sender<Result<Vec<ClientPingRecord>>>,
    },
}

/// Handle to the ping cache. Clones share the same cache task.
#[derive(Clone)]
pub struct PingCache {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<Vec<ClientPingRecord>>,
}

impl PingCache {
    /// Load the persisted list and start the cache task.
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let initial = load(store.as_ref()).await?.unwrap_or_default();
        debug!(count = initial.len(), "Ping cache loaded");

        let (commands, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (view_tx, view) = watch::channel(initial);
        tokio::spawn(run(store, rx, view_tx));

        Ok(Self { commands, view })
    }

    /// Prepend a freshly sent ping.
    pub async fn append(&self, record: ClientPingRecord) -> Result<()> {
        self.request(|reply| Command::Append { record, reply }).await
    }

    /// Set the status of the entry with `id`, leaving every other entry untouched.
    ///
    /// Returns whether an entry matched. With nothing persisted yet this is
    /// a no-op.
    pub async fn update_status(&self, id: &NotificationId, status: &str) -> Result<bool> {
        let id = id.clone();
        let status = status.to_string();
        self.request(|reply| Command::UpdateStatus { id, status, reply })
            .await
    }

    /// Remove the persisted list and empty the view.
    pub async fn clear_all(&self) -> Result<()> {
        self.request(|reply| Command::ClearAll { reply }).await
    }

    /// Re-read the persisted list into the view.
    pub async fn reload(&self) -> Result<Vec<ClientPingRecord>> {
        self.request(|reply| Command::Reload { reply }).await
    }

    /// Current list, most recent first.
    pub fn snapshot(&self) -> Vec<ClientPingRecord> {
        self.view.borrow().clone()
    }

    /// Watch the list; the receiver sees every persisted change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ClientPingRecord>> {
        self.view.clone()
    }

    /// Ids of cached pings still waiting for a read receipt.
    pub fn pending_ids(&self) -> Vec<NotificationId> {
        self.view
            .borrow()
            .iter()
            .filter(|r| r.is_pending())
            .map(|r| r.notification_id.clone())
            .collect()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ClientError::CacheClosed)?;
        rx.await.map_err(|_| ClientError::CacheClosed)?
    }
}

async fn run(
    store: Arc<dyn KeyValueStore>,
    mut commands: mpsc::Receiver<Command>,
    view: watch::Sender<Vec<ClientPingRecord>>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Append { record, reply } => {
                let _ = reply.send(append(store.as_ref(), &view, record).await);
            }
            Command::UpdateStatus { id, status, reply } => {
                let _ = reply.send(update_status(store.as_ref(), &view, &id, &status).await);
            }
            Command::ClearAll { reply } => {
                let _ = reply.send(clear_all(store.as_ref(), &view).await);
            }
            Command::Reload { reply } => {
                let result = load(store.as_ref()).await.map(|list| {
                    let list = list.unwrap_or_default();
                    view.send_replace(list.clone());
                    list
                });
                let _ = reply.send(result);
            }
        }
    }
    debug!("Ping cache task stopped");
}

/// Read the persisted list.
///
/// A blob that no longer decodes is treated as absent: the cache starts
/// empty, the next append overwrites it and clear-all removes it.
async fn load(store: &dyn KeyValueStore) -> Result<Option<Vec<ClientPingRecord>>> {
    let Some(raw) = store.get(SENT_PINGS_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(list) => Ok(Some(list)),
        Err(e) => {
            warn!(error = %e, "Ignoring undecodable ping cache");
            Ok(None)
        }
    }
}

async fn save(store: &dyn KeyValueStore, list: &[ClientPingRecord]) -> Result<()> {
    let raw = serde_json::to_string(list)?;
    store.set(SENT_PINGS_KEY, &raw).await
}

async fn append(
    store: &dyn KeyValueStore,
    view: &watch::Sender<Vec<ClientPingRecord>>,
    record: ClientPingRecord,
) -> Result<()> {
    let mut list = load(store).await?.unwrap_or_default();
    debug!(notification_id = %record.notification_id, "Caching sent ping");
    list.insert(0, record);
    save(store, &list).await?;
    view.send_replace(list);
    Ok(())
}

async fn update_status(
    store: &dyn KeyValueStore,
    view: &watch::Sender<Vec<ClientPingRecord>>,
    id: &NotificationId,
    status: &str,
) -> Result<bool> {
    let Some(list) = load(store).await? else {
        debug!(notification_id = %id, "No cached pings, status update ignored");
        return Ok(false);
    };

    let mut matched = false;
    let list: Vec<ClientPingRecord> = list
        .into_iter()
        .map(|record| {
            if record.notification_id == *id {
                matched = true;
                record.with_status(status)
            } else {
                record
            }
        })
        .collect();

    if !matched {
        warn!(notification_id = %id, "Status update for a ping not in the cache");
    }

    save(store, &list).await?;
    view.send_replace(list);
    Ok(matched)
}

async fn clear_all(
    store: &dyn KeyValueStore,
    view: &watch::Sender<Vec<ClientPingRecord>>,
) -> Result<()> {
    store.remove(SENT_PINGS_KEY).await?;
    view.send_replace(Vec::new());
    Ok(())
}
