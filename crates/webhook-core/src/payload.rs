//! Typed model of the Meta webhook notification shape.
//!
//! Every field defaults when absent so that a partial or malformed payload
//! decodes to a value the processor can still walk. Nothing in here
//! validates; interpretation happens in [`crate::content`] and
//! [`crate::processor`].

use serde::{Deserialize, Serialize};

use crate::content::{InteractiveType, MessageType};

/// Top-level webhook notification: `object` plus a list of entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Always "whatsapp_business_account" for the payloads we care about.
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

/// One entry in a notification. A single delivery may carry several.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    /// Business account id.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// A change within an entry; `value` is the payload the core interprets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: ChangeValue,
}

/// The innermost value of one entry/change pair.
///
/// The three lists are all optional on the wire; their presence drives
/// classification (see [`crate::processor::classify`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messaging_product: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub contacts: Vec<ContactNotice>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub statuses: Vec<StatusNotice>,
}

/// Metadata identifying the business number that received the event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub display_phone_number: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
}

/// A contact object delivered alongside messages or on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactNotice {
    #[serde(default)]
    pub wa_id: Option<String>,
    #[serde(default)]
    pub profile: Option<ContactProfile>,
}

/// Profile block of a contact object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactProfile {
    #[serde(default)]
    pub name: Option<String>,
}

/// One inbound message. The `type` string selects which nested object is
/// expected, but none of them are required to be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    /// Unix timestamp as a decimal string.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Declared message type as sent on the wire, e.g. "text" or "image".
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextContent>,
    #[serde(default)]
    pub image: Option<MediaContent>,
    #[serde(default)]
    pub video: Option<MediaContent>,
    #[serde(default)]
    pub document: Option<DocumentContent>,
    #[serde(default)]
    pub location: Option<LocationContent>,
    #[serde(default)]
    pub button: Option<ButtonContent>,
    #[serde(default)]
    pub interactive: Option<InteractiveContent>,
}

impl Message {
    /// The declared type resolved to the enumerated set the extractor
    /// dispatches on. Unrecognized and missing types resolve to
    /// [`MessageType::Unknown`].
    pub fn message_type(&self) -> MessageType {
        MessageType::from_kind(&self.kind)
    }

    /// Message timestamp parsed from its decimal-string form. Missing or
    /// unparsable timestamps degrade to 0 rather than failing the message.
    pub fn unix_timestamp(&self) -> i64 {
        self.timestamp
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Body of a text message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub body: String,
}

/// Shared shape of image and video content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaContent {
    #[serde(default)]
    pub caption: Option<String>,
}

/// Document content; the filename stands in for a body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentContent {
    #[serde(default)]
    pub filename: Option<String>,
}

/// Location content. Coordinates stay optional so a truncated payload
/// still renders (as the literal `null`) instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationContent {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// A tapped quick-reply button.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ButtonContent {
    #[serde(default)]
    pub text: Option<String>,
}

/// An interactive message reply (button or list selection).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractiveContent {
    /// Reply subtype as sent on the wire, e.g. "button_reply".
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub button_reply: Option<ReplyContent>,
    #[serde(default)]
    pub list_reply: Option<ReplyContent>,
}

impl InteractiveContent {
    /// The reply subtype resolved to the enumerated set.
    pub fn interactive_type(&self) -> InteractiveType {
        InteractiveType::from_kind(&self.kind)
    }
}

/// Selected item of an interactive reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyContent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A delivery status notification for a previously sent message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusNotice {
    /// Id of the message the status refers to.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
