//! Client-to-server envelopes and frame decoding.

use serde::Deserialize;

/// One decoded client frame.
///
/// Internally tagged on `type`; each variant carries only its required
/// fields, so dispatch over the closed set is checked exhaustively at
/// compile time.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEnvelope {
    /// Claim a display name and request the history snapshot.
    Join {
        /// Display name to announce. Untrusted; any client may claim any name.
        username: String,
    },
    /// Plain text message.
    Message {
        /// Sender display name as carried in the frame.
        username: String,
        /// Message body.
        text: String,
    },
    /// Text message with an attached image.
    #[serde(rename_all = "camelCase")]
    Image {
        /// Sender display name as carried in the frame.
        username: String,
        /// Optional caption.
        #[serde(default)]
        text: Option<String>,
        /// Base64-encoded image payload.
        image: String,
        /// MIME type of the payload.
        image_type: String,
    },
    /// Request the page of history older than a cursor.
    #[serde(rename_all = "camelCase")]
    LoadMore {
        /// Exclusive upper bound: only messages with `id < beforeId` are returned.
        before_id: i64,
    },
}

/// Decodes one text frame into a [`ClientEnvelope`].
///
/// Returns `None` for malformed structure or unknown `type` tags. The
/// caller drops such frames without replying; a relay with no
/// authentication has no trust boundary to protect with error frames.
#[must_use]
pub fn decode(frame: &str) -> Option<ClientEnvelope> {
    serde_json::from_str(frame).ok()
}
