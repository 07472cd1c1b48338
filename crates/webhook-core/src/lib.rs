//! Webhook payload interpretation and conversation upsert core.
//!
//! This crate is the heart of the WhatsApp gateway: it decodes Meta's
//! webhook notification shape, classifies each change value, extracts
//! display bodies from messages, translates delivery statuses, and keeps
//! the conversations table current through the upsert engine. It defines:
//!
//! - [`WebhookPayload`] and friends - the typed wire model
//! - [`classify`] / [`EventCategory`] - branch selection per change value
//! - [`message_body`] - message content extraction with placeholders
//! - [`translate_status`] - delivery status labels
//! - [`ConversationStore`] - the narrow persistence seam
//! - [`upsert_conversation`] - the create-or-refresh engine
//! - [`Processor`] - the orchestrator walking a whole delivery
//!
//! Storage lives behind [`ConversationStore`], so the SQLite implementation
//! and in-memory fakes are interchangeable.
//!
//! # Example
//!
//! ```rust
//! use webhook_core::{classify, ChangeValue, EventCategory};
//!
//! let value: ChangeValue = serde_json::from_str(
//!     r#"{"statuses": [{"status": "READ"}]}"#,
//! ).unwrap();
//! assert_eq!(classify(&value), vec![EventCategory::Statuses]);
//! ```

pub mod content;
pub mod payload;
pub mod processor;
pub mod status;
pub mod store;

pub use content::{message_body, InteractiveType, MessageType};
pub use payload::{
    ChangeValue, ContactNotice, ContactProfile, Entry, Message, Metadata, StatusNotice,
    WebhookPayload,
};
pub use processor::{
    classify, ContactRecord, EventCategory, MessageRecord, ProcessSummary, Processor,
    StatusRecord, UpsertRecord,
};
pub use status::translate_status;
pub use store::{
    upsert_conversation, Conversation, ConversationStore, NewConversation, StoreError,
    UpsertOutcome, DEFAULT_PROFILE,
};

// Re-export async_trait so implementors don't need their own dependency.
pub use async_trait::async_trait;
