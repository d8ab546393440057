//! Chat message model shared by the store and the wire protocol.

use serde::{Deserialize, Serialize};

/// A persisted chat message.
///
/// Immutable once created: the store assigns `id` and `timestamp` at
/// insert time and rows are never updated or deleted. The same struct is
/// the wire shape for history frames, hence the camelCase field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Monotonically increasing row id assigned by the store.
    pub id: i64,
    /// Display name claimed by the sender. Untrusted, never validated.
    pub username: String,
    /// Message body. Empty only when an image is attached.
    pub text: String,
    /// Milliseconds since the Unix epoch, assigned at persistence time.
    pub timestamp: i64,
    /// Base64-encoded image payload, if any.
    pub image: Option<String>,
    /// MIME type of `image`; present exactly when `image` is.
    pub image_type: Option<String>,
}

/// One page of older history returned by a cursor query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    /// Messages in ascending id order.
    pub messages: Vec<ChatMessage>,
    /// Whether history older than this page exists.
    pub has_more: bool,
}
