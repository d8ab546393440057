//! Server-to-client envelopes.

use serde::Serialize;

use crate::domain::ChatMessage;

/// One outbound frame.
///
/// `Join`, `Message` and `Image` mirror the inbound envelopes verbatim:
/// live broadcasts carry exactly the fields the sender supplied, while
/// store-assigned ids and timestamps appear only in history frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEnvelope {
    /// A client announced a display name.
    Join {
        /// The announced display name.
        username: String,
    },
    /// A text message, relayed verbatim.
    Message {
        /// Sender display name as carried in the inbound frame.
        username: String,
        /// Message body.
        text: String,
    },
    /// An image message, relayed verbatim.
    #[serde(rename_all = "camelCase")]
    Image {
        /// Sender display name as carried in the inbound frame.
        username: String,
        /// Optional caption.
        text: Option<String>,
        /// Base64-encoded image payload.
        image: String,
        /// MIME type of the payload.
        image_type: String,
    },
    /// History snapshot sent to a joining connection only.
    History {
        /// Most recent messages in ascending id order.
        messages: Vec<ChatMessage>,
    },
    /// Reply to a `load_more` request, sent to the requester only.
    #[serde(rename_all = "camelCase")]
    MoreHistory {
        /// The requested page in ascending id order.
        messages: Vec<ChatMessage>,
        /// Whether history older than this page exists.
        has_more: bool,
    },
    /// A joined connection disconnected.
    Leave {
        /// Display name the departed connection had claimed.
        username: String,
    },
}
