//! Per-receiving-number settings lookups.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Settings;

/// The default profile configured for a receiving number, if a settings
/// row exists for it.
pub async fn get_default_profile(
    pool: &SqlitePool,
    phone_number_id: &str,
) -> Result<Option<String>> {
    let profile = sqlx::query_scalar::<_, String>(
        r#"
        SELECT default_profile
        FROM settings
        WHERE phone_number_id = ?
        "#,
    )
    .bind(phone_number_id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

/// The full settings row for a receiving number.
pub async fn get_settings(pool: &SqlitePool, phone_number_id: &str) -> Result<Option<Settings>> {
    let record = sqlx::query_as::<_, Settings>(
        r#"
        SELECT id, phone_number_id, default_profile, webhook_verify_token, meta_token
        FROM settings
        WHERE phone_number_id = ?
        "#,
    )
    .bind(phone_number_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Create the settings row for a receiving number. Used at bootstrap; the
/// processing core only ever reads settings.
pub async fn insert_settings(
    pool: &SqlitePool,
    phone_number_id: &str,
    default_profile: &str,
    webhook_verify_token: Option<&str>,
    meta_token: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO settings (phone_number_id, default_profile, webhook_verify_token, meta_token)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(phone_number_id)
    .bind(default_profile)
    .bind(webhook_verify_token)
    .bind(meta_token)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Settings",
                    key: phone_number_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(result.last_insert_rowid())
}
