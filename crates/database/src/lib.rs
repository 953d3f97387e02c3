//! SQLite persistence layer for the ping tracker.
//!
//! This crate is the source of truth for ping state. It stores users and
//! pings using SQLx with SQLite, and publishes every mutation of the
//! `notifications` table on an in-process [`ChangeFeed`].
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, models::User, ping, user};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:pings.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let sender = User::new(1, "Asha", "software").with_push_token("abc");
//!     let recipient = User::new(2, "Ravi", "hardware").with_push_token("def");
//!     user::create_user(db.pool(), &sender).await?;
//!     user::create_user(db.pool(), &recipient).await?;
//!
//!     // Ping and mark read; both mutations appear on the change feed
//!     let mut changes = db.changes().subscribe();
//!     let sent = ping::insert_ping(&db, 1, 2, "Hi").await?;
//!     ping::mark_read(&db, sent.id).await?;
//!     let _insert = changes.recv().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod changes;
pub mod error;
pub mod models;
pub mod ping;
pub mod user;
pub mod validation;

pub use changes::ChangeFeed;
pub use error::{DatabaseError, Result};
pub use models::{Ping, PingStatus, User};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
///
/// Cloning is cheap; clones share the pool and the change feed.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/pings.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing, use a single connection)
    /// let db = database::Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// Every connection to `sqlite::memory:` opens a separate database, so
    /// in-memory databases need a pool size of 1.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self {
            pool,
            changes: ChangeFeed::default(),
        })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the change feed for the `notifications` table.
    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    pub async fn seed_users(db: &Database) {
        user::create_user(db.pool(), &User::new(1, "Asha", "software").with_push_token("abc"))
            .await
            .unwrap();
        user::create_user(db.pool(), &User::new(2, "Ravi", "hardware").with_push_token("def"))
            .await
            .unwrap();
        user::create_user(db.pool(), &User::new(3, "Noor", "hardware"))
            .await
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_ping_lifecycle() {
        let db = test_db().await;
        seed_users(&db).await;

        // Create
        let sent = ping::insert_ping(&db, 1, 2, "Hi").await.unwrap();
        assert_eq!(sent.status, PingStatus::Sent);
        assert_eq!(ping::count_pings(db.pool()).await.unwrap(), 1);

        // Read
        let fetched = ping::get_ping(db.pool(), sent.id).await.unwrap();
        assert_eq!(fetched, sent);

        // Update
        let read = ping::mark_read(&db, sent.id).await.unwrap();
        assert_eq!(read.status, PingStatus::Read);
        assert_eq!(read.id, sent.id);

        // Missing
        let result = ping::get_ping(db.pool(), sent.id + 100).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
