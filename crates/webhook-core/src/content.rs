//! Message content extraction.
//!
//! Maps a message's declared type to a single display string. Missing or
//! malformed nested content always degrades to a placeholder or an empty
//! string; nothing in this module can fail.

use crate::payload::{InteractiveContent, MediaContent, Message};

/// The enumerated message types the extractor dispatches on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    Sticker,
    Document,
    Location,
    Contacts,
    Button,
    Interactive,
    /// Any type not listed above, including a missing one.
    #[default]
    Unknown,
}

impl MessageType {
    /// Resolve a wire-level type string.
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "text" => MessageType::Text,
            "image" => MessageType::Image,
            "video" => MessageType::Video,
            "audio" => MessageType::Audio,
            "sticker" => MessageType::Sticker,
            "document" => MessageType::Document,
            "location" => MessageType::Location,
            "contacts" => MessageType::Contacts,
            "button" => MessageType::Button,
            "interactive" => MessageType::Interactive,
            _ => MessageType::Unknown,
        }
    }
}

/// Subtypes of an interactive reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractiveType {
    ButtonReply,
    ListReply,
    /// Any other interactive subtype.
    #[default]
    Other,
}

impl InteractiveType {
    /// Resolve a wire-level interactive subtype string.
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "button_reply" => InteractiveType::ButtonReply,
            "list_reply" => InteractiveType::ListReply,
            _ => InteractiveType::Other,
        }
    }
}

/// Extract a human-readable body from any message.
///
/// Total over all inputs: unknown types yield `(message)` and absent nested
/// content yields the placeholder for the declared type.
pub fn message_body(message: &Message) -> String {
    match message.message_type() {
        MessageType::Text => message
            .text
            .as_ref()
            .map(|text| text.body.clone())
            .unwrap_or_default(),
        MessageType::Image => caption_or(message.image.as_ref(), "(image)"),
        MessageType::Video => caption_or(message.video.as_ref(), "(video)"),
        MessageType::Audio => "(audio)".to_string(),
        MessageType::Sticker => "(sticker)".to_string(),
        MessageType::Document => message
            .document
            .as_ref()
            .and_then(|document| non_empty(document.filename.as_deref()))
            .unwrap_or_else(|| "(document)".to_string()),
        MessageType::Location => {
            let (latitude, longitude) = message
                .location
                .as_ref()
                .map(|location| (location.latitude, location.longitude))
                .unwrap_or((None, None));
            format!("lat:{} lon:{}", coordinate(latitude), coordinate(longitude))
        }
        MessageType::Contacts => "(contact)".to_string(),
        MessageType::Button => message
            .button
            .as_ref()
            .and_then(|button| non_empty(button.text.as_deref()))
            .unwrap_or_else(|| "(button)".to_string()),
        MessageType::Interactive => interactive_body(message.interactive.as_ref()),
        MessageType::Unknown => "(message)".to_string(),
    }
}

fn interactive_body(interactive: Option<&InteractiveContent>) -> String {
    let Some(interactive) = interactive else {
        return "(interactive)".to_string();
    };
    match interactive.interactive_type() {
        InteractiveType::ButtonReply => interactive
            .button_reply
            .as_ref()
            .and_then(|reply| non_empty(reply.title.as_deref()))
            .unwrap_or_else(|| "(button)".to_string()),
        InteractiveType::ListReply => interactive
            .list_reply
            .as_ref()
            .and_then(|reply| non_empty(reply.title.as_deref()))
            .unwrap_or_else(|| "(list)".to_string()),
        InteractiveType::Other => "(interactive)".to_string(),
    }
}

fn caption_or(media: Option<&MediaContent>, placeholder: &str) -> String {
    media
        .and_then(|media| non_empty(media.caption.as_deref()))
        .unwrap_or_else(|| placeholder.to_string())
}

/// An empty string counts as absent content.
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

/// Render an optional coordinate, spelling out absence as the JSON null
/// marker rather than dropping the field.
fn coordinate(value: Option<f64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}
