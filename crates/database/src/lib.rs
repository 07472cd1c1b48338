//! SQLite persistence layer for the WhatsApp webhook gateway.
//!
//! This crate provides async database operations for the raw webhook event
//! log, the conversations table, and the per-number settings using SQLx
//! with SQLite. It also implements [`webhook_core::ConversationStore`] for
//! [`Database`], which is what the processing core runs against.
//!
//! # Example
//!
//! ```no_run
//! use database::{webhook_event, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:webhooks.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Append a raw delivery to the event log
//!     let payload = serde_json::json!({"object": "whatsapp_business_account"});
//!     let id = webhook_event::insert_event(db.pool(), &payload).await?;
//!     println!("stored webhook event #{id}");
//!
//!     Ok(())
//! }
//! ```

pub mod conversation;
pub mod error;
pub mod models;
pub mod settings;
pub mod webhook_event;

pub use error::{DatabaseError, Result};
pub use models::{Conversation, Settings, WebhookEvent};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Pool size sized for bursts of concurrent webhook deliveries.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist, or
    /// `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// Call once after connecting so the schema, including the composite
    /// uniqueness constraint on conversations, is in place.
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

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
