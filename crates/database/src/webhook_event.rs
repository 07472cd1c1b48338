//! Raw webhook event log, append-only.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::WebhookEvent;

/// Append one raw delivery to the event log and return its id.
pub async fn insert_event(pool: &SqlitePool, payload: &serde_json::Value) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO webhook_events (payload)
        VALUES (?)
        "#,
    )
    .bind(payload.to_string())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get a stored event by ID.
pub async fn get_event(pool: &SqlitePool, id: i64) -> Result<WebhookEvent> {
    sqlx::query_as::<_, WebhookEvent>(
        r#"
        SELECT id, received_at, payload
        FROM webhook_events
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "WebhookEvent",
        key: id.to_string(),
    })
}

/// Count stored events.
pub async fn count_events(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM webhook_events
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
