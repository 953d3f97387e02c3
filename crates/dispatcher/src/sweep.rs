//! Periodic deletion of expired pings.

use std::sync::Mutex;
use std::time::Duration;

use database::{ping, Database};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::DEFAULT_RETENTION;

/// Deletes pings older than the retention window on a fixed period.
///
/// The retention window is a soft bound: a ping swept before its sender's
/// change-feed subscription delivers the read receipt is lost to that
/// sender, so the window must exceed round trip plus reconnect latency.
pub struct SweepTask {
    db: Database,
    retention: Duration,
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SweepTask {
    /// Create a sweep with the default 10 minute window and period.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            retention: DEFAULT_RETENTION,
            period: DEFAULT_RETENTION,
            handle: Mutex::new(None),
        }
    }

    /// Set how old a ping must be before it is deleted.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Set how often the sweep runs.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run one sweep, returning how many pings were deleted.
    pub async fn run_once(&self) -> database::Result<usize> {
        sweep(&self.db, self.retention).await
    }

    /// Start sweeping in the background. Calling it again while running is a no-op.
    ///
    /// The first sweep runs one period after start.
    pub fn start(&self) {
        let Ok(mut handle) = self.handle.lock() else {
            return;
        };
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let db = self.db.clone();
        let retention = self.retention;
        let period = self.period;

        info!(retention = ?retention, period = ?period, "Starting retention sweep");

        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = sweep(&db, retention).await {
                    // Keep sweeping; the next tick may succeed
                    error!("Retention sweep failed: {}", e);
                }
            }
        }));
    }

    /// Stop the background sweep. Calling it when stopped is a no-op.
    pub fn stop(&self) {
        if let Ok(mut handle) = self.handle.lock() {
            if let Some(h) = handle.take() {
                h.abort();
                info!("Retention sweep stopped");
            }
        }
    }

    /// Whether the background sweep is running.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .map(|h| h.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for SweepTask {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweep(db: &Database, retention: Duration) -> database::Result<usize> {
    let deleted = ping::delete_older_than(db, retention).await?;
    if deleted.is_empty() {
        debug!("Retention sweep found nothing to delete");
    } else {
        info!(deleted = deleted.len(), "Retention sweep deleted expired pings");
    }
    Ok(deleted.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::models::User;
    use database::user;

    async fn test_db() -> Database {
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
        db
    }

    #[tokio::test]
    async fn test_run_once_deletes_only_expired() {
        let db = test_db().await;
        let fresh = ping::insert_ping(&db, 1, 2, "fresh").await.unwrap();
        insert_stale(&db, 1, 2, "stale").await;

        let sweep = SweepTask::new(db.clone());
        assert_eq!(sweep.run_once().await.unwrap(), 1);

        assert_eq!(ping::count_pings(db.pool()).await.unwrap(), 1);
        assert!(ping::get_ping(db.pool(), fresh.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_start_stop_are_idempotent() {
        let db = test_db().await;
        let sweep = SweepTask::new(db).with_period(Duration::from_secs(3600));

        sweep.start();
        sweep.start();
        assert!(sweep.is_running());

        sweep.stop();
        sweep.stop();
        assert!(!sweep.is_running());
    }

    /// Insert a ping whose `created_at` is an hour in the past.
    async fn insert_stale(db: &Database, sender_id: i64, recipient_id: i64, message: &str) {
        sqlx::query(
            r#"
            INSERT INTO notifications (sender_id, recipient_id, message, status, created_at)
            VALUES (?, ?, ?, 'sent', datetime('now', '-1 hour'))
            "#,
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(message)
        .execute(db.pool())
        .await
        .unwrap();
    }
}
