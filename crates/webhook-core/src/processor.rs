//! Webhook orchestration: classify each entry/change value and run the
//! matching branches.
//!
//! Every branch degrades per item: a malformed message, status, or contact
//! never stops its siblings, and a storage failure during an upsert is
//! logged and counted rather than propagated.

use tracing::{error, info};

use crate::content::{message_body, MessageType};
use crate::payload::{ChangeValue, Metadata, WebhookPayload};
use crate::status::translate_status;
use crate::store::{upsert_conversation, ConversationStore, UpsertOutcome};

/// Shown when a display field has no value to show.
const MISSING_FIELD: &str = "-";

/// The processing branches a change value can trigger.
///
/// `Messages` and `Statuses` are independent and may both fire for one
/// value; `ContactsOnly` fires only when neither of the others does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Messages,
    Statuses,
    ContactsOnly,
}

/// Decide which branches apply to a change value.
///
/// Pure routing: an empty result means the value carries nothing we
/// process, which is a silent no-op rather than an error.
pub fn classify(value: &ChangeValue) -> Vec<EventCategory> {
    let mut categories = Vec::new();
    if !value.messages.is_empty() {
        categories.push(EventCategory::Messages);
    }
    if !value.statuses.is_empty() {
        categories.push(EventCategory::Statuses);
    }
    if categories.is_empty() && !value.contacts.is_empty() {
        categories.push(EventCategory::ContactsOnly);
    }
    categories
}

/// Display record for one received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub sender: String,
    pub receiver: String,
    pub message_type: MessageType,
    pub body: String,
    pub timestamp: i64,
}

/// Display record for one delivery status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    /// The business number the status was reported to.
    pub business_number: String,
    pub recipient: String,
    /// Translated status label.
    pub status: String,
    pub message_id: String,
}

/// Display record for one standalone contact event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub wa_id: String,
    pub receiver: String,
    pub name: String,
}

/// One conversation upsert performed while processing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertRecord {
    pub wa_id: String,
    pub phone_number_id: String,
    pub outcome: UpsertOutcome,
}

/// Everything one webhook delivery produced.
#[derive(Debug, Default)]
pub struct ProcessSummary {
    pub messages: Vec<MessageRecord>,
    pub statuses: Vec<StatusRecord>,
    pub contacts: Vec<ContactRecord>,
    pub upserts: Vec<UpsertRecord>,
    /// Upserts that failed on the storage side. Never aborts processing.
    pub upsert_failures: usize,
}

/// Walks a decoded webhook payload and dispatches each change value to the
/// branches [`classify`] selects.
pub struct Processor<S> {
    store: S,
}

impl<S: ConversationStore> Processor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Process every entry and change in one delivery.
    pub async fn process(&self, payload: &WebhookPayload) -> ProcessSummary {
        let mut summary = ProcessSummary::default();
        for entry in &payload.entry {
            for change in &entry.changes {
                let value = &change.value;
                for category in classify(value) {
                    match category {
                        EventCategory::Messages => {
                            self.process_messages(value, &mut summary).await;
                        }
                        EventCategory::Statuses => collect_statuses(value, &mut summary),
                        EventCategory::ContactsOnly => collect_contacts(value, &mut summary),
                    }
                }
            }
        }
        summary
    }

    async fn process_messages(&self, value: &ChangeValue, summary: &mut ProcessSummary) {
        let receiver = receiver_from_metadata(value.metadata.as_ref());
        let phone_number_id = value
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.phone_number_id.as_deref())
            .filter(|id| !id.is_empty());

        for message in &value.messages {
            let sender = message
                .from
                .clone()
                .unwrap_or_else(|| MISSING_FIELD.to_string());
            let body = message_body(message);
            let timestamp = message.unix_timestamp();
            info!(
                %sender,
                %receiver,
                message_type = ?message.message_type(),
                %body,
                timestamp,
                "message received"
            );
            summary.messages.push(MessageRecord {
                sender,
                receiver: receiver.clone(),
                message_type: message.message_type(),
                body,
                timestamp,
            });

            // Without a receiving number there is no conversation key to
            // upsert under; the message itself is still recorded above.
            let Some(phone_number_id) = phone_number_id else {
                continue;
            };
            for contact in &value.contacts {
                let Some(wa_id) = contact.wa_id.as_deref().filter(|id| !id.is_empty()) else {
                    continue;
                };
                let name = contact
                    .profile
                    .as_ref()
                    .and_then(|profile| profile.name.clone())
                    .unwrap_or_else(|| wa_id.to_string());
                match upsert_conversation(&self.store, wa_id, &name, phone_number_id, timestamp)
                    .await
                {
                    Ok(outcome) => summary.upserts.push(UpsertRecord {
                        wa_id: wa_id.to_string(),
                        phone_number_id: phone_number_id.to_string(),
                        outcome,
                    }),
                    Err(err) => {
                        error!(error = %err, wa_id, phone_number_id, "conversation upsert failed");
                        summary.upsert_failures += 1;
                    }
                }
            }
        }
    }
}

fn collect_statuses(value: &ChangeValue, summary: &mut ProcessSummary) {
    let business_number = receiver_from_metadata(value.metadata.as_ref());
    for status in &value.statuses {
        let record = StatusRecord {
            business_number: business_number.clone(),
            recipient: status
                .recipient_id
                .clone()
                .unwrap_or_else(|| MISSING_FIELD.to_string()),
            status: translate_status(status.status.as_deref()),
            message_id: status.id.clone().unwrap_or_else(|| MISSING_FIELD.to_string()),
        };
        info!(
            recipient = %record.recipient,
            status = %record.status,
            message_id = %record.message_id,
            "status updated"
        );
        summary.statuses.push(record);
    }
}

fn collect_contacts(value: &ChangeValue, summary: &mut ProcessSummary) {
    let receiver = receiver_from_metadata(value.metadata.as_ref());
    for contact in &value.contacts {
        let record = ContactRecord {
            wa_id: contact
                .wa_id
                .clone()
                .unwrap_or_else(|| MISSING_FIELD.to_string()),
            receiver: receiver.clone(),
            name: contact
                .profile
                .as_ref()
                .and_then(|profile| profile.name.clone())
                .unwrap_or_else(|| MISSING_FIELD.to_string()),
        };
        info!(wa_id = %record.wa_id, name = %record.name, "contact event");
        summary.contacts.push(record);
    }
}

/// Display value for the receiving side: the human-readable number when
/// present, the internal id otherwise.
fn receiver_from_metadata(metadata: Option<&Metadata>) -> String {
    metadata
        .and_then(|metadata| {
            metadata
                .display_phone_number
                .clone()
                .filter(|number| !number.is_empty())
                .or_else(|| {
                    metadata
                        .phone_number_id
                        .clone()
                        .filter(|id| !id.is_empty())
                })
        })
        .unwrap_or_else(|| MISSING_FIELD.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Conversation, NewConversation, StoreError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Minimal store fake: remembers rows, optionally fails every write.
    #[derive(Default)]
    struct RecordingStore {
        profiles: HashMap<String, String>,
        rows: Mutex<HashMap<(String, String), Conversation>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl ConversationStore for RecordingStore {
        async fn default_profile(
            &self,
            phone_number_id: &str,
        ) -> Result<Option<String>, StoreError> {
            Ok(self.profiles.get(phone_number_id).cloned())
        }

        async fn find_conversation(
            &self,
            wa_id: &str,
            phone_number_id: &str,
        ) -> Result<Option<Conversation>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(&(wa_id.to_string(), phone_number_id.to_string()))
                .cloned())
        }

        async fn insert_conversation(
            &self,
            conversation: NewConversation,
        ) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Storage("disk full".to_string()));
            }
            self.rows.lock().unwrap().insert(
                (
                    conversation.wa_id.clone(),
                    conversation.phone_number_id.clone(),
                ),
                Conversation {
                    wa_id: conversation.wa_id,
                    phone_number_id: conversation.phone_number_id,
                    name: Some(conversation.name),
                    profile: conversation.profile,
                    bot_enabled: conversation.bot_enabled,
                    automatic_message_enabled: false,
                    created_at: "t0".to_string(),
                    last_message_timestamp: conversation.last_message_timestamp,
                },
            );
            Ok(())
        }

        async fn update_conversation(
            &self,
            wa_id: &str,
            phone_number_id: &str,
            name: &str,
            last_message_timestamp: i64,
        ) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Storage("disk full".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) =
                rows.get_mut(&(wa_id.to_string(), phone_number_id.to_string()))
            {
                row.name = Some(name.to_string());
                row.last_message_timestamp = last_message_timestamp;
            }
            Ok(())
        }
    }

    fn payload_from(json: &str) -> WebhookPayload {
        serde_json::from_str(json).unwrap()
    }

    fn wrap_value(value: &str) -> WebhookPayload {
        payload_from(&format!(
            r#"{{"entry": [{{"changes": [{{"value": {value}}}]}}]}}"#
        ))
    }

    #[test]
    fn classify_messages_and_statuses_both_fire() {
        let value: ChangeValue = serde_json::from_str(
            r#"{
                "messages": [{"type": "text"}],
                "statuses": [{"status": "sent"}],
                "contacts": [{"wa_id": "1"}]
            }"#,
        )
        .unwrap();
        assert_eq!(
            classify(&value),
            vec![EventCategory::Messages, EventCategory::Statuses]
        );
    }

    #[test]
    fn classify_contacts_only_requires_absence_of_both() {
        let contacts_only: ChangeValue =
            serde_json::from_str(r#"{"contacts": [{"wa_id": "1"}]}"#).unwrap();
        assert_eq!(classify(&contacts_only), vec![EventCategory::ContactsOnly]);

        let with_statuses: ChangeValue = serde_json::from_str(
            r#"{"contacts": [{"wa_id": "1"}], "statuses": [{"status": "sent"}]}"#,
        )
        .unwrap();
        assert_eq!(classify(&with_statuses), vec![EventCategory::Statuses]);
    }

    #[test]
    fn classify_empty_value_is_a_no_op() {
        assert!(classify(&ChangeValue::default()).is_empty());
    }

    #[tokio::test]
    async fn text_message_with_contact_upserts_conversation() {
        let mut store = RecordingStore::default();
        store
            .profiles
            .insert("524386454098961".to_string(), "assistant".to_string());
        let processor = Processor::new(store);

        let payload = wrap_value(
            r#"{
                "messages": [{
                    "from": "5561999",
                    "type": "text",
                    "text": {"body": "oi"},
                    "timestamp": "1700000000"
                }],
                "contacts": [{"wa_id": "5561999", "profile": {"name": "Ana"}}],
                "metadata": {"phone_number_id": "524386454098961"}
            }"#,
        );
        let summary = processor.process(&payload).await;

        assert_eq!(summary.messages.len(), 1);
        assert_eq!(summary.messages[0].body, "oi");
        assert_eq!(summary.messages[0].sender, "5561999");
        assert_eq!(summary.messages[0].timestamp, 1_700_000_000);

        assert_eq!(summary.upserts.len(), 1);
        assert_eq!(summary.upserts[0].outcome, UpsertOutcome::Created);
        let rows = processor.store.rows.lock().unwrap();
        let row = rows
            .get(&("5561999".to_string(), "524386454098961".to_string()))
            .unwrap();
        assert_eq!(row.name.as_deref(), Some("Ana"));
        assert_eq!(row.profile, "assistant");
        assert_eq!(row.last_message_timestamp, 1_700_000_000);
    }

    #[tokio::test]
    async fn contact_without_name_upserts_under_wa_id() {
        let processor = Processor::new(RecordingStore::default());
        let payload = wrap_value(
            r#"{
                "messages": [{"from": "5561999", "type": "audio", "timestamp": "5"}],
                "contacts": [{"wa_id": "5561999"}],
                "metadata": {"phone_number_id": "111"}
            }"#,
        );
        processor.process(&payload).await;

        let rows = processor.store.rows.lock().unwrap();
        let row = rows
            .get(&("5561999".to_string(), "111".to_string()))
            .unwrap();
        assert_eq!(row.name.as_deref(), Some("5561999"));
    }

    #[tokio::test]
    async fn missing_phone_number_id_skips_upsert_but_keeps_record() {
        let processor = Processor::new(RecordingStore::default());
        let payload = wrap_value(
            r#"{
                "messages": [{"from": "5561999", "type": "text", "text": {"body": "hi"}}],
                "contacts": [{"wa_id": "5561999", "profile": {"name": "Ana"}}]
            }"#,
        );
        let summary = processor.process(&payload).await;

        assert_eq!(summary.messages.len(), 1);
        assert!(summary.upserts.is_empty());
        assert_eq!(summary.upsert_failures, 0);
        assert!(processor.store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn statuses_translate_without_touching_storage() {
        let processor = Processor::new(RecordingStore::default());
        let payload = wrap_value(
            r#"{
                "statuses": [{"recipient_id": "5561999", "status": "READ", "id": "wamid.1"}]
            }"#,
        );
        let summary = processor.process(&payload).await;

        assert_eq!(summary.statuses.len(), 1);
        assert_eq!(summary.statuses[0].status, "read");
        assert_eq!(summary.statuses[0].recipient, "5561999");
        assert_eq!(summary.statuses[0].message_id, "wamid.1");
        assert!(summary.upserts.is_empty());
        assert!(processor.store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn contacts_only_produces_records_without_upsert() {
        let processor = Processor::new(RecordingStore::default());
        let payload = wrap_value(
            r#"{
                "contacts": [{"wa_id": "5561999", "profile": {"name": "Ana"}}],
                "metadata": {"display_phone_number": "556180000000"}
            }"#,
        );
        let summary = processor.process(&payload).await;

        assert_eq!(summary.contacts.len(), 1);
        assert_eq!(summary.contacts[0].wa_id, "5561999");
        assert_eq!(summary.contacts[0].name, "Ana");
        assert_eq!(summary.contacts[0].receiver, "556180000000");
        assert!(summary.upserts.is_empty());
        assert!(processor.store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn messages_and_statuses_in_one_value_both_process() {
        let processor = Processor::new(RecordingStore::default());
        let payload = wrap_value(
            r#"{
                "messages": [{"from": "1", "type": "sticker"}],
                "statuses": [{"status": "delivered"}],
                "contacts": [{"wa_id": "1"}],
                "metadata": {"phone_number_id": "111"}
            }"#,
        );
        let summary = processor.process(&payload).await;

        assert_eq!(summary.messages.len(), 1);
        assert_eq!(summary.messages[0].body, "(sticker)");
        assert_eq!(summary.statuses.len(), 1);
        // Contacts rode along with a message, so they upsert instead of
        // producing standalone contact records.
        assert!(summary.contacts.is_empty());
        assert_eq!(summary.upserts.len(), 1);
    }

    #[tokio::test]
    async fn every_entry_and_change_is_walked() {
        let processor = Processor::new(RecordingStore::default());
        let payload = payload_from(
            r#"{
                "entry": [
                    {"changes": [
                        {"value": {"messages": [{"from": "1", "type": "text", "text": {"body": "a"}}]}},
                        {"value": {"statuses": [{"status": "sent"}]}}
                    ]},
                    {"changes": [
                        {"value": {"messages": [{"from": "2", "type": "text", "text": {"body": "b"}}]}}
                    ]}
                ]
            }"#,
        );
        let summary = processor.process(&payload).await;

        assert_eq!(summary.messages.len(), 2);
        assert_eq!(summary.statuses.len(), 1);
    }

    #[tokio::test]
    async fn storage_failure_is_counted_and_processing_continues() {
        let store = RecordingStore {
            fail_writes: true,
            ..RecordingStore::default()
        };
        let processor = Processor::new(store);
        let payload = wrap_value(
            r#"{
                "messages": [
                    {"from": "1", "type": "text", "text": {"body": "a"}, "timestamp": "1"},
                    {"from": "1", "type": "text", "text": {"body": "b"}, "timestamp": "2"}
                ],
                "contacts": [{"wa_id": "1", "profile": {"name": "Ana"}}],
                "metadata": {"phone_number_id": "111"}
            }"#,
        );
        let summary = processor.process(&payload).await;

        // Both messages were still recorded despite the failing store.
        assert_eq!(summary.messages.len(), 2);
        assert_eq!(summary.upsert_failures, 2);
        assert!(summary.upserts.is_empty());
    }

    #[tokio::test]
    async fn malformed_message_degrades_without_stopping_siblings() {
        let processor = Processor::new(RecordingStore::default());
        let payload = wrap_value(
            r#"{
                "messages": [
                    {"type": "location"},
                    {"from": "2", "type": "text", "text": {"body": "ok"}}
                ]
            }"#,
        );
        let summary = processor.process(&payload).await;

        assert_eq!(summary.messages.len(), 2);
        assert_eq!(summary.messages[0].sender, "-");
        assert_eq!(summary.messages[0].body, "lat:null lon:null");
        assert_eq!(summary.messages[1].body, "ok");
    }
}
