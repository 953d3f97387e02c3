//! Ping CRUD operations.
//!
//! Every mutation is published on the database's [`ChangeFeed`](crate::ChangeFeed)
//! after it commits, which is why mutating functions take the whole
//! [`Database`] rather than the pool.

use std::time::Duration;

use ping_core::ChangeEvent;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{Ping, PingStatus};
use crate::validation::validate_message;
use crate::Database;

/// Insert a new ping with status `sent`.
pub async fn insert_ping(
    db: &Database,
    sender_id: i64,
    recipient_id: i64,
    message: &str,
) -> Result<Ping> {
    validate_message(message)?;

    let ping = sqlx::query_as::<_, Ping>(
        r#"
        INSERT INTO notifications (sender_id, recipient_id, message, status)
        VALUES (?, ?, ?, ?)
        RETURNING id, sender_id, recipient_id, message, status, created_at
        "#,
    )
    .bind(sender_id)
    .bind(recipient_id)
    .bind(message)
    .bind(PingStatus::Sent)
    .fetch_one(db.pool())
    .await?;

    tracing::debug!(notification_id = ping.id, sender_id, recipient_id, "Ping stored");
    db.changes().publish(ChangeEvent::insert(ping.clone()));

    Ok(ping)
}

/// Get a ping by ID.
pub async fn get_ping(pool: &SqlitePool, id: i64) -> Result<Ping> {
    sqlx::query_as::<_, Ping>(
        r#"
        SELECT id, sender_id, recipient_id, message, status, created_at
        FROM notifications
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Notification",
        id: id.to_string(),
    })
}

/// Mark a ping as read.
///
/// Idempotent: an already-read ping is updated again and reported as
/// success. Every call publishes an `UPDATE` change event.
pub async fn mark_read(db: &Database, id: i64) -> Result<Ping> {
    let old = get_ping(db.pool(), id).await?;

    let new = sqlx::query_as::<_, Ping>(
        r#"
        UPDATE notifications
        SET status = ?
        WHERE id = ?
        RETURNING id, sender_id, recipient_id, message, status, created_at
        "#,
    )
    .bind(PingStatus::Read)
    .bind(id)
    .fetch_optional(db.pool())
    .await?
    // Swept between the lookup and the update
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Notification",
        id: id.to_string(),
    })?;

    tracing::debug!(
        notification_id = id,
        was = %old.status,
        "Ping marked read"
    );
    db.changes().publish(ChangeEvent::update(old, new.clone()));

    Ok(new)
}

/// Get the pings among `ids` that were sent by `sender_id`.
pub async fn pings_for_sender(pool: &SqlitePool, sender_id: i64, ids: &[i64]) -> Result<Vec<Ping>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
        "SELECT id, sender_id, recipient_id, message, status, created_at \
         FROM notifications WHERE sender_id = ",
    );
    query.push_bind(sender_id);
    query.push(" AND id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    let pings = query.build_query_as::<Ping>().fetch_all(pool).await?;
    Ok(pings)
}

/// List the pings a user has sent, newest first.
pub async fn list_sent_by(pool: &SqlitePool, sender_id: i64) -> Result<Vec<Ping>> {
    let pings = sqlx::query_as::<_, Ping>(
        r#"
        SELECT id, sender_id, recipient_id, message, status, created_at
        FROM notifications
        WHERE sender_id = ?
        ORDER BY id DESC
        "#,
    )
    .bind(sender_id)
    .fetch_all(pool)
    .await?;

    Ok(pings)
}

/// Delete every ping created more than `max_age` ago.
///
/// Returns the deleted rows; each is also published as a `DELETE` event.
pub async fn delete_older_than(db: &Database, max_age: Duration) -> Result<Vec<Ping>> {
    let modifier = format!("-{} seconds", max_age.as_secs());

    let deleted = sqlx::query_as::<_, Ping>(
        r#"
        DELETE FROM notifications
        WHERE created_at < datetime('now', ?)
        RETURNING id, sender_id, recipient_id, message, status, created_at
        "#,
    )
    .bind(modifier)
    .fetch_all(db.pool())
    .await?;

    for ping in &deleted {
        db.changes().publish(ChangeEvent::delete(ping.clone()));
    }

    Ok(deleted)
}

/// Count stored pings.
pub async fn count_pings(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM notifications
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_users, test_db};
    use ping_core::ChangeKind;

    #[tokio::test]
    async fn test_insert_publishes_and_returns_row() {
        let db = test_db().await;
        seed_users(&db).await;
        let mut feed = db.changes().subscribe();

        let ping = insert_ping(&db, 1, 2, "Hi").await.unwrap();
        assert_eq!(ping.sender_id, 1);
        assert_eq!(ping.recipient_id, 2);
        assert_eq!(ping.message, "Hi");
        assert!(!ping.created_at.is_empty());

        let event = feed.recv().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.new, Some(ping));
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let db = test_db().await;
        seed_users(&db).await;
        let ping = insert_ping(&db, 1, 2, "Hi").await.unwrap();
        let mut feed = db.changes().subscribe();

        let first = mark_read(&db, ping.id).await.unwrap();
        let second = mark_read(&db, ping.id).await.unwrap();
        assert_eq!(first.status, PingStatus::Read);
        assert_eq!(second.status, PingStatus::Read);

        let event = feed.recv().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.old.as_ref().map(|p| p.status), Some(PingStatus::Sent));
        assert_eq!(event.read_receipt(), Some(ping.notification_id()));

        // The repeat still reports an update, now read -> read
        let event = feed.recv().await.unwrap();
        assert_eq!(event.old.map(|p| p.status), Some(PingStatus::Read));
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id() {
        let db = test_db().await;
        let result = mark_read(&db, 404).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_overlong_message_rejected() {
        let db = test_db().await;
        seed_users(&db).await;

        let result = insert_ping(&db, 1, 2, &"x".repeat(201)).await;
        assert!(matches!(result, Err(DatabaseError::Invalid(_))));
        assert_eq!(count_pings(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pings_for_sender_filters_owner() {
        let db = test_db().await;
        seed_users(&db).await;
        let mine = insert_ping(&db, 1, 2, "a").await.unwrap();
        let theirs = insert_ping(&db, 2, 1, "b").await.unwrap();

        let found = pings_for_sender(db.pool(), 1, &[mine.id, theirs.id, 9999])
            .await
            .unwrap();
        assert_eq!(found, vec![mine.clone()]);
        assert!(pings_for_sender(db.pool(), 1, &[]).await.unwrap().is_empty());

        let listed = list_sent_by(db.pool(), 1).await.unwrap();
        assert_eq!(listed, vec![mine]);
    }

    #[tokio::test]
    async fn test_delete_older_than_keeps_fresh_rows() {
        let db = test_db().await;
        seed_users(&db).await;
        let fresh = insert_ping(&db, 1, 2, "fresh").await.unwrap();
        sqlx::query(
            r#"
            INSERT INTO notifications (sender_id, recipient_id, message, status, created_at)
            VALUES (1, 2, 'stale', 'sent', datetime('now', '-11 minutes'))
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();
        let mut feed = db.changes().subscribe();

        let deleted = delete_older_than(&db, Duration::from_secs(600)).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].message, "stale");
        assert_eq!(feed.recv().await.unwrap().kind, ChangeKind::Delete);

        assert_eq!(count_pings(db.pool()).await.unwrap(), 1);
        assert!(get_ping(db.pool(), fresh.id).await.is_ok());
    }
}
