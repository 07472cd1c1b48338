//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One raw webhook delivery, stored verbatim. Append-only: rows are never
/// updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WebhookEvent {
    /// Auto-incrementing ID.
    pub id: i64,
    /// When the delivery arrived.
    pub received_at: String,
    /// The raw JSON payload as received.
    pub payload: String,
}

/// A conversation row: one per (wa_id, phone_number_id) pair, enforced by
/// the composite unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// Auto-incrementing ID.
    pub id: i64,
    /// WhatsApp id of the external user.
    pub wa_id: String,
    /// Profile kind assigned at creation (e.g. "human").
    pub profile: String,
    /// Display name from the contact's profile.
    pub name: Option<String>,
    /// Creation timestamp; set once, never mutated.
    pub created_at: String,
    /// Whether the bot answers this conversation. Derived at creation.
    pub bot_enabled: bool,
    /// Whether automatic messages are enabled. Defaults off.
    pub automatic_message_enabled: bool,
    /// The business number this conversation belongs to.
    pub phone_number_id: String,
    /// Unix timestamp of the latest message.
    pub last_message_timestamp: i64,
}

impl Conversation {
    /// Strip the row id down to the shape the processing core works with.
    pub fn into_core(self) -> webhook_core::Conversation {
        webhook_core::Conversation {
            wa_id: self.wa_id,
            phone_number_id: self.phone_number_id,
            name: self.name,
            profile: self.profile,
            bot_enabled: self.bot_enabled,
            automatic_message_enabled: self.automatic_message_enabled,
            created_at: self.created_at,
            last_message_timestamp: self.last_message_timestamp,
        }
    }
}

/// Per-receiving-number configuration. Read-only from the core's
/// perspective; one row is looked up per upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Settings {
    /// Auto-incrementing ID.
    pub id: i64,
    /// The business number these settings apply to.
    pub phone_number_id: String,
    /// Profile kind used to seed new conversations.
    pub default_profile: String,
    /// Secret echoed back during webhook challenge verification.
    pub webhook_verify_token: Option<String>,
    /// Meta Graph API token for this number.
    pub meta_token: Option<String>,
}
