//! Local notification presenter.
//!
//! Turns incoming push messages into on-device notifications carrying a
//! "Mark as Read" action, and reports the action (or a plain tap) back to
//! the dispatcher. The device's notification system sits behind
//! [`NotificationSurface`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ping_core::NotificationId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::DispatcherClient;
use crate::error::Result;

/// Press action fired by tapping the notification body.
pub const DEFAULT_PRESS_ACTION: &str = "default";

/// Press action of the "Mark as Read" button.
pub const MARK_READ_ACTION: &str = "mark-read";

/// Label of the "Mark as Read" button.
pub const MARK_READ_TITLE: &str = "Mark as Read";

/// Notification channel pings are shown on.
pub const NOTIFICATION_CHANNEL: &str = "default";

const INBOX_CAPACITY: usize = 32;

/// A push message as received by the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingPush {
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: HashMap<String, String>,
}

/// A button on a displayed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub id: String,
    pub title: String,
}

/// A notification ready to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub channel_id: String,
    /// Press action fired by tapping the body.
    pub press_action: String,
    pub actions: Vec<NotificationAction>,
    /// Push data, kept so interactions can find the ping id.
    pub data: HashMap<String, String>,
}

impl LocalNotification {
    /// Build the notification for a push.
    ///
    /// Data-only pushes have nothing to show and yield `None`.
    pub fn from_push(push: &IncomingPush) -> Option<Self> {
        if push.title.is_none() && push.body.is_none() {
            return None;
        }
        Some(Self {
            title: push.title.clone().unwrap_or_default(),
            body: push.body.clone().unwrap_or_default(),
            channel_id: NOTIFICATION_CHANNEL.to_string(),
            press_action: DEFAULT_PRESS_ACTION.to_string(),
            actions: vec![NotificationAction {
                id: MARK_READ_ACTION.to_string(),
                title: MARK_READ_TITLE.to_string(),
            }],
            data: push.data.clone(),
        })
    }
}

/// The user pressed a displayed notification or one of its actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interaction {
    pub press_action: Option<String>,
    pub data: HashMap<String, String>,
}

impl Interaction {
    /// The ping this interaction marks read, if any.
    pub fn read_target(&self) -> Option<NotificationId> {
        match self.press_action.as_deref() {
            Some(DEFAULT_PRESS_ACTION) | Some(MARK_READ_ACTION) => {}
            _ => return None,
        }
        self.data
            .get("notification_id")
            .map(NotificationId::new)
            .filter(|id| !id.is_empty())
    }
}

/// The device's notification system.
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Show a notification.
    async fn display(&self, notification: LocalNotification) -> Result<()>;
}

/// Input to a running presenter.
#[derive(Debug, Clone)]
pub enum PresenterEvent {
    Push(IncomingPush),
    Interaction(Interaction),
}

struct Inner {
    api: DispatcherClient,
    surface: Arc<dyn NotificationSurface>,
}

/// Service object presenting pushes and handling their actions.
pub struct NotificationPresenter {
    inner: Arc<Inner>,
    running: Mutex<Option<(mpsc::Sender<PresenterEvent>, JoinHandle<()>)>>,
}

impl NotificationPresenter {
    pub fn new(api: DispatcherClient, surface: Arc<dyn NotificationSurface>) -> Self {
        Self {
            inner: Arc::new(Inner { api, surface }),
            running: Mutex::new(None),
        }
    }

    /// Start handling events; returns the inbox to feed them into.
    ///
    /// Calling it again while running returns the same inbox.
    pub fn start(&self) -> Option<mpsc::Sender<PresenterEvent>> {
        let mut running = self.running.lock().ok()?;
        if let Some((inbox, handle)) = running.as_ref() {
            if !handle.is_finished() {
                return Some(inbox.clone());
            }
        }

        info!("Starting notification presenter");
        let (inbox, mut rx) = mpsc::channel(INBOX_CAPACITY);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    PresenterEvent::Push(push) => {
                        if let Err(e) = inner.present(&push).await {
                            error!("Failed to display notification: {}", e);
                        }
                    }
                    PresenterEvent::Interaction(interaction) => {
                        inner.handle_interaction(&interaction).await;
                    }
                }
            }
        });
        *running = Some((inbox.clone(), handle));
        Some(inbox)
    }

    /// Stop handling events. A no-op when not running.
    pub fn stop(&self) {
        if let Ok(mut running) = self.running.lock() {
            if let Some((_, handle)) = running.take() {
                handle.abort();
                info!("Notification presenter stopped");
            }
        }
    }

    /// Display a push; returns what was shown.
    pub async fn present(&self, push: &IncomingPush) -> Result<Option<LocalNotification>> {
        self.inner.present(push).await
    }

    /// React to a press. Returns whether a mark-read was accepted.
    ///
    /// Failures are logged and not retried.
    pub async fn handle_interaction(&self, interaction: &Interaction) -> bool {
        self.inner.handle_interaction(interaction).await
    }
}

impl Drop for NotificationPresenter {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    async fn present(&self, push: &IncomingPush) -> Result<Option<LocalNotification>> {
        let Some(notification) = LocalNotification::from_push(push) else {
            debug!("Data-only push, nothing to display");
            return Ok(None);
        };
        self.surface.display(notification.clone()).await?;
        Ok(Some(notification))
    }

    async fn handle_interaction(&self, interaction: &Interaction) -> bool {
        let Some(id) = interaction.read_target() else {
            return false;
        };
        match self.api.mark_read(&id).await {
            Ok(()) => {
                info!(notification_id = %id, "Notification marked as read");
                true
            }
            Err(e) => {
                warn!(notification_id = %id, "Error marking notification as read: {}", e);
                false
            }
        }
    }
}
