//! User lookups and push-token rotation.
//!
//! Users are created by registration, which lives outside this subsystem;
//! [`create_user`] exists for provisioning and tests.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Create a new user.
pub async fn create_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, domain, push_token)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.domain)
    .bind(&user.push_token)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: user.id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, domain, push_token
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Get the user whose id and push token both match.
///
/// Returns `None` on any mismatch, so a forged `sender_id` paired with
/// someone else's token is indistinguishable from an unknown user.
pub async fn verify_sender(pool: &SqlitePool, id: i64, token: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, domain, push_token
        FROM users
        WHERE id = ? AND push_token = ?
        "#,
    )
    .bind(id)
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Get the user currently holding a push token.
pub async fn find_by_push_token(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, domain, push_token
        FROM users
        WHERE push_token = ?
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Rotate a user's push token.
pub async fn update_push_token(pool: &SqlitePool, id: i64, token: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET push_token = ?
        WHERE id = ?
        "#,
    )
    .bind(token)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    tracing::info!(user_id = id, "Push token rotated");
    Ok(())
}

/// List all users in a domain.
pub async fn list_users_in_domain(pool: &SqlitePool, domain: &str) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, domain, push_token
        FROM users
        WHERE domain = ?
        ORDER BY name
        "#,
    )
    .bind(domain)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_users, test_db};

    #[tokio::test]
    async fn test_verify_sender_requires_matching_token() {
        let db = test_db().await;
        seed_users(&db).await;

        let user = verify_sender(db.pool(), 1, "abc").await.unwrap();
        assert_eq!(user.map(|u| u.name), Some("Asha".to_string()));

        // Right id, someone else's token
        assert!(verify_sender(db.pool(), 1, "def").await.unwrap().is_none());
        // Unknown id
        assert!(verify_sender(db.pool(), 42, "abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_rotation() {
        let db = test_db().await;
        seed_users(&db).await;

        update_push_token(db.pool(), 1, "rotated").await.unwrap();
        assert!(verify_sender(db.pool(), 1, "abc").await.unwrap().is_none());
        assert!(verify_sender(db.pool(), 1, "rotated").await.unwrap().is_some());

        let owner = find_by_push_token(db.pool(), "rotated").await.unwrap();
        assert_eq!(owner.map(|u| u.id), Some(1));

        let result = update_push_token(db.pool(), 99, "x").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_user_rejected() {
        let db = test_db().await;
        seed_users(&db).await;

        let result = create_user(db.pool(), &User::new(1, "Again", "software")).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_list_users_in_domain() {
        let db = test_db().await;
        seed_users(&db).await;

        let hardware = list_users_in_domain(db.pool(), "hardware").await.unwrap();
        let names: Vec<_> = hardware.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Noor", "Ravi"]);
        assert_eq!(get_user(db.pool(), 3).await.unwrap().push_token, None);
    }
}
