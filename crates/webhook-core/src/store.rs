//! Conversation storage interface and the contact upsert engine.
//!
//! The engine only sees the narrow [`ConversationStore`] trait, so the real
//! SQLite store and in-memory test fakes are interchangeable behind it.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Profile assigned when the receiving number has no settings row.
pub const DEFAULT_PROFILE: &str = "human";

/// Errors surfaced by a conversation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert hit an existing row for the same conversation key. The
    /// engine treats this as losing the create race and retries as an
    /// update.
    #[error("conversation already exists: {0}")]
    AlreadyExists(String),

    /// The backing store failed (connection, query, constraint other than
    /// the conversation key).
    #[error("storage error: {0}")]
    Storage(String),
}

/// A persisted conversation, one row per (wa_id, phone_number_id) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub wa_id: String,
    pub phone_number_id: String,
    pub name: Option<String>,
    pub profile: String,
    pub bot_enabled: bool,
    pub automatic_message_enabled: bool,
    pub created_at: String,
    pub last_message_timestamp: i64,
}

/// Fields for a conversation row being created for the first time.
///
/// `automatic_message_enabled` and `created_at` are intentionally absent:
/// the store fills them with their creation defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConversation {
    pub wa_id: String,
    pub phone_number_id: String,
    pub name: String,
    pub profile: String,
    pub bot_enabled: bool,
    pub last_message_timestamp: i64,
}

/// What the upsert engine did with a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First message for this key; a new row was created.
    Created,
    /// The row already existed; name and timestamp were refreshed.
    Updated,
}

/// Narrow persistence interface the core depends on.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Default profile configured for a receiving number, if any.
    async fn default_profile(
        &self,
        phone_number_id: &str,
    ) -> Result<Option<String>, StoreError>;

    /// Look up a conversation by its composite key.
    async fn find_conversation(
        &self,
        wa_id: &str,
        phone_number_id: &str,
    ) -> Result<Option<Conversation>, StoreError>;

    /// Insert a brand-new conversation row. Must fail with
    /// [`StoreError::AlreadyExists`] when the composite key is taken.
    async fn insert_conversation(
        &self,
        conversation: NewConversation,
    ) -> Result<(), StoreError>;

    /// Refresh name and last message timestamp on an existing row. Profile
    /// and bot activation are creation-time values and stay untouched.
    async fn update_conversation(
        &self,
        wa_id: &str,
        phone_number_id: &str,
        name: &str,
        last_message_timestamp: i64,
    ) -> Result<(), StoreError>;
}

/// Create or refresh the conversation for one (wa_id, phone_number_id) pair.
///
/// New rows take their profile from the receiving number's settings (falling
/// back to [`DEFAULT_PROFILE`]) and derive bot activation from it. Existing
/// rows only have their name and last message timestamp refreshed. Two
/// deliveries racing to create the same conversation resolve to a single
/// row: the loser of the insert race falls back to the update path.
pub async fn upsert_conversation<S>(
    store: &S,
    wa_id: &str,
    name: &str,
    phone_number_id: &str,
    last_message_timestamp: i64,
) -> Result<UpsertOutcome, StoreError>
where
    S: ConversationStore + ?Sized,
{
    let profile = store
        .default_profile(phone_number_id)
        .await?
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
    let bot_enabled = profile != DEFAULT_PROFILE;

    if let Some(existing) = store.find_conversation(wa_id, phone_number_id).await? {
        store
            .update_conversation(wa_id, phone_number_id, name, last_message_timestamp)
            .await?;
        debug!(
            wa_id,
            phone_number_id,
            created_at = %existing.created_at,
            "conversation refreshed"
        );
        return Ok(UpsertOutcome::Updated);
    }

    let conversation = NewConversation {
        wa_id: wa_id.to_string(),
        phone_number_id: phone_number_id.to_string(),
        name: name.to_string(),
        profile: profile.clone(),
        bot_enabled,
        last_message_timestamp,
    };
    match store.insert_conversation(conversation).await {
        Ok(()) => {
            info!(wa_id, phone_number_id, profile = %profile, bot_enabled, "conversation created");
            Ok(UpsertOutcome::Created)
        }
        Err(StoreError::AlreadyExists(_)) => {
            // A concurrent delivery created the row between our lookup and
            // insert; the constraint kept it unique, so finish as an update.
            store
                .update_conversation(wa_id, phone_number_id, name, last_message_timestamp)
                .await?;
            Ok(UpsertOutcome::Updated)
        }
        Err(err) => Err(err),
    }
}
