//! Conversation storage keyed by (wa_id, phone_number_id).
//!
//! The composite unique constraint on the table is the only guard against
//! two concurrent deliveries creating the same conversation twice; a
//! violated insert surfaces as [`DatabaseError::AlreadyExists`] so the
//! upsert engine can finish as an update.

use async_trait::async_trait;
use sqlx::SqlitePool;
use webhook_core::{ConversationStore, NewConversation, StoreError};

use crate::error::{DatabaseError, Result};
use crate::models::Conversation;
use crate::{settings, Database};

/// Look up a conversation by its composite key.
pub async fn find_conversation(
    pool: &SqlitePool,
    wa_id: &str,
    phone_number_id: &str,
) -> Result<Option<Conversation>> {
    let record = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, wa_id, profile, name, created_at, bot_enabled,
               automatic_message_enabled, phone_number_id, last_message_timestamp
        FROM conversations
        WHERE wa_id = ? AND phone_number_id = ?
        "#,
    )
    .bind(wa_id)
    .bind(phone_number_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Insert a new conversation row.
///
/// `created_at` and `automatic_message_enabled` take their column defaults.
/// A duplicate composite key maps to [`DatabaseError::AlreadyExists`].
pub async fn insert_conversation(pool: &SqlitePool, conversation: &NewConversation) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO conversations
            (wa_id, name, profile, bot_enabled, phone_number_id, last_message_timestamp)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&conversation.wa_id)
    .bind(&conversation.name)
    .bind(&conversation.profile)
    .bind(conversation.bot_enabled)
    .bind(&conversation.phone_number_id)
    .bind(conversation.last_message_timestamp)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Conversation",
                    key: format!("{}/{}", conversation.wa_id, conversation.phone_number_id),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Refresh the display name and last message timestamp of an existing row.
/// Everything set at creation stays as it is.
pub async fn update_conversation(
    pool: &SqlitePool,
    wa_id: &str,
    phone_number_id: &str,
    name: &str,
    last_message_timestamp: i64,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET name = ?, last_message_timestamp = ?
        WHERE wa_id = ? AND phone_number_id = ?
        "#,
    )
    .bind(name)
    .bind(last_message_timestamp)
    .bind(wa_id)
    .bind(phone_number_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Conversation",
            key: format!("{}/{}", wa_id, phone_number_id),
        });
    }

    Ok(())
}

/// List all conversations, most recently active first.
pub async fn list_conversations(pool: &SqlitePool) -> Result<Vec<Conversation>> {
    let conversations = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, wa_id, profile, name, created_at, bot_enabled,
               automatic_message_enabled, phone_number_id, last_message_timestamp
        FROM conversations
        ORDER BY last_message_timestamp DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(conversations)
}

/// Count conversation rows.
pub async fn count_conversations(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM conversations
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[async_trait]
impl ConversationStore for Database {
    async fn default_profile(
        &self,
        phone_number_id: &str,
    ) -> std::result::Result<Option<String>, StoreError> {
        settings::get_default_profile(self.pool(), phone_number_id)
            .await
            .map_err(StoreError::from)
    }

    async fn find_conversation(
        &self,
        wa_id: &str,
        phone_number_id: &str,
    ) -> std::result::Result<Option<webhook_core::Conversation>, StoreError> {
        let record = find_conversation(self.pool(), wa_id, phone_number_id)
            .await
            .map_err(StoreError::from)?;
        Ok(record.map(Conversation::into_core))
    }

    async fn insert_conversation(
        &self,
        conversation: NewConversation,
    ) -> std::result::Result<(), StoreError> {
        insert_conversation(self.pool(), &conversation)
            .await
            .map_err(StoreError::from)
    }

    async fn update_conversation(
        &self,
        wa_id: &str,
        phone_number_id: &str,
        name: &str,
        last_message_timestamp: i64,
    ) -> std::result::Result<(), StoreError> {
        update_conversation(self.pool(), wa_id, phone_number_id, name, last_message_timestamp)
            .await
            .map_err(StoreError::from)
    }
}
