//! End-to-end tests: the real dispatcher on an ephemeral port, driven by
//! the client library.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use database::models::User;
use database::{ping, user, Database};
use dispatcher::{app, AppState};
use ping_client::{
    ClientConfig, ClientError, ClientPingRecord, DispatcherClient, FeedStatus, Identity,
    IncomingPush, Interaction, LocalNotification, MemoryStore, NotificationPresenter,
    NotificationSurface, PingCache, PingSession, ReadReceiptListener, Recipient, TickMark,
};
use ping_core::ChangeEvent;
use push_gateway::mock::RecordingGateway;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    config: ClientConfig,
    db: Database,
    gateway: RecordingGateway,
}

impl Harness {
    async fn start() -> Self {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        user::create_user(db.pool(), &User::new(1, "Asha", "software").with_push_token("abc"))
            .await
            .unwrap();
        user::create_user(db.pool(), &User::new(2, "Ravi", "hardware").with_push_token("def"))
            .await
            .unwrap();

        // Next generated ping id is 501
        sqlx::query(
            "INSERT INTO notifications (id, sender_id, recipient_id, message) VALUES (500, 1, 2, 'seed')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query("DELETE FROM notifications WHERE id = 500")
            .execute(db.pool())
            .await
            .unwrap();

        let gateway = RecordingGateway::new();
        let router = app(AppState::new(db.clone(), Arc::new(gateway.clone())));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            config: ClientConfig::new(format!("http://{}", addr)),
            db,
            gateway,
        }
    }

    async fn session(&self, identity: Identity) -> (PingSession, MemoryStore) {
        let store = MemoryStore::new();
        let session = PingSession::with_store(&self.config, identity, Arc::new(store.clone()))
            .await
            .unwrap();
        (session, store)
    }
}

fn asha() -> Identity {
    Identity::new(1, "Asha", "abc")
}

#[derive(Default)]
struct RecordingSurface {
    shown: Mutex<Vec<LocalNotification>>,
}

#[async_trait]
impl NotificationSurface for RecordingSurface {
    async fn display(&self, notification: LocalNotification) -> ping_client::Result<()> {
        self.shown.lock().unwrap().push(notification);
        Ok(())
    }
}

async fn wait_until<F>(cache: &PingCache, done: F)
where
    F: Fn(&[ClientPingRecord]) -> bool,
{
    let mut view = cache.subscribe();
    timeout(WAIT, async {
        loop {
            if done(&view.borrow_and_update()) {
                return;
            }
            view.changed().await.unwrap();
        }
    })
    .await
    .expect("timed out waiting for the ping cache");
}

async fn wait_subscribed(listener: &ReadReceiptListener) {
    let mut status = listener.status();
    timeout(WAIT, status.wait_for(|s| *s == FeedStatus::Subscribed))
        .await
        .expect("timed out waiting for the feed")
        .unwrap();
}

#[tokio::test]
async fn test_ping_is_read_end_to_end() {
    let harness = Harness::start().await;
    let (sender, _) = harness.session(asha()).await;
    sender.start();
    wait_subscribed(sender.listener()).await;

    // Sender pings recipient 2
    let record = sender
        .send_ping(&Recipient::new(2, "Ravi"), Some("Hi"))
        .await
        .unwrap();
    assert_eq!(record.notification_id, "501");

    let cached = sender.pings();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].status, "sent");
    assert_eq!(cached[0].tick(), Some(TickMark::Single));

    let row = ping::get_ping(harness.db.pool(), 501).await.unwrap();
    assert_eq!(row.status.as_str(), "sent");

    // Recipient's device shows the push and presses "Mark as Read"
    let pushed = harness.gateway.sent_to("def");
    assert_eq!(pushed.len(), 1);
    let visible = pushed[0].notification.clone().unwrap();
    let push = IncomingPush {
        title: Some(visible.title),
        body: Some(visible.body),
        data: pushed[0].data.clone(),
    };

    let surface = Arc::new(RecordingSurface::default());
    let presenter = NotificationPresenter::new(
        DispatcherClient::new(&harness.config).unwrap(),
        surface.clone(),
    );
    let shown = presenter.present(&push).await.unwrap().unwrap();
    assert_eq!(shown.body, "Asha: Hi");

    let pressed = Interaction {
        press_action: Some(shown.actions[0].id.clone()),
        data: shown.data.clone(),
    };
    assert!(presenter.handle_interaction(&pressed).await);

    let row = ping::get_ping(harness.db.pool(), 501).await.unwrap();
    assert_eq!(row.status.as_str(), "read");

    // The receipt flows back through the change feed
    wait_until(sender.cache(), |list| {
        list.first().is_some_and(|r| r.status == "read")
    })
    .await;
    assert_eq!(sender.pings()[0].tick(), Some(TickMark::Double));

    sender.stop();
}

#[tokio::test]
async fn test_rejected_send_caches_nothing() {
    let harness = Harness::start().await;
    let (sender, store) = harness.session(Identity::new(1, "Asha", "wrong")).await;

    let result = sender.send_ping(&Recipient::new(2, "Ravi"), None).await;

    match result {
        Err(ClientError::Rejected { status, error }) => {
            assert_eq!(status, 401);
            assert_eq!(error, "Unauthorized access");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(sender.pings().is_empty());
    assert!(!store.contains(ping_client::SENT_PINGS_KEY));
    assert_eq!(ping::count_pings(harness.db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_default_client_message() {
    let harness = Harness::start().await;
    let (sender, _) = harness.session(asha()).await;

    let record = sender
        .send_ping(&Recipient::new(2, "Ravi"), Some("  "))
        .await
        .unwrap();

    assert_eq!(record.message, "Ping from Asha");
}

#[tokio::test]
async fn test_backfill_after_missed_receipt() {
    let harness = Harness::start().await;
    let (sender, _) = harness.session(asha()).await;

    // Sent while the feed is down; read before it comes up
    let record = sender
        .send_ping(&Recipient::new(2, "Ravi"), Some("Hi"))
        .await
        .unwrap();
    let id = record.notification_id.as_i64().unwrap();
    ping::mark_read(&harness.db, id).await.unwrap();
    assert_eq!(sender.pings()[0].status, "sent");

    sender.start();

    wait_until(sender.cache(), |list| {
        list.first().is_some_and(|r| r.status == "read")
    })
    .await;
}

#[tokio::test]
async fn test_receipt_lost_to_feed_overrun_is_backfilled() {
    let harness = Harness::start().await;
    let (sender, _) = harness.session(asha()).await;
    sender.start();
    wait_subscribed(sender.listener()).await;

    let record = sender
        .send_ping(&Recipient::new(2, "Ravi"), Some("Hi"))
        .await
        .unwrap();
    let id = record.notification_id.as_i64().unwrap();

    // Row is read, but the receipt event is pushed out of the feed buffer
    let before = ping::get_ping(harness.db.pool(), id).await.unwrap();
    sqlx::query("UPDATE notifications SET status = 'read' WHERE id = ?")
        .bind(id)
        .execute(harness.db.pool())
        .await
        .unwrap();
    let after = ping::get_ping(harness.db.pool(), id).await.unwrap();

    let mut foreign = before.clone();
    foreign.sender_id = 2;
    let changes = harness.db.changes();
    changes.publish(ChangeEvent::update(before, after));
    for _ in 0..1100 {
        changes.publish(ChangeEvent::delete(foreign.clone()));
    }

    wait_until(sender.cache(), |list| {
        list.first().is_some_and(|r| r.status == "read")
    })
    .await;
    assert_eq!(sender.pings()[0].tick(), Some(TickMark::Double));

    sender.stop();
}

#[tokio::test]
async fn test_listener_keeps_one_subscription_per_user() {
    let harness = Harness::start().await;
    let (mut sender, _) = harness.session(asha()).await;

    sender.start();
    wait_subscribed(sender.listener()).await;
    sender.start();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(harness.db.changes().subscriber_count(), 1);
    assert_eq!(sender.listener().user_id(), Some(1));

    sender.switch_identity(Identity::new(2, "Ravi", "def"));
    assert_eq!(sender.listener().user_id(), Some(2));

    sender.stop();
    sender.stop();
    assert_eq!(sender.listener().user_id(), None);
    assert_eq!(*sender.listener().status().borrow(), FeedStatus::Closed);
}

#[tokio::test]
async fn test_group_ping_broadcasts_without_caching() {
    let harness = Harness::start().await;
    let (sender, _) = harness.session(asha()).await;

    let confirmation = sender.send_group_ping("hardware", None).await.unwrap();

    assert_eq!(confirmation, "Group ping sent");
    assert_eq!(harness.gateway.broadcasts().len(), 1);
    assert!(sender.pings().is_empty());
    assert_eq!(ping::count_pings(harness.db.pool()).await.unwrap(), 0);
}
