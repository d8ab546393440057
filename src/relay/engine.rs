//! Relay engine: the single place where protocol events become
//! persistence effects and outbound frames.
//!
//! Every dispatch method follows the pattern: validate → persist (when the
//! event kind persists) → fan out. Broadcast only ever follows a
//! successful write; a failed write is logged and the event vanishes.

use crate::domain::{ConnectionId, ConnectionRegistry, OutboundSender};
use crate::persistence::MessageStore;
use crate::protocol::{self, ClientEnvelope, ServerEnvelope};

/// Number of messages in the history snapshot sent on join.
const HISTORY_SNAPSHOT_LIMIT: i64 = 100;

/// Page size for cursor pagination replies.
const HISTORY_PAGE_LIMIT: i64 = 50;

/// Routes inbound events to the store and the live connection set.
///
/// Frames from one connection are handled to completion in arrival order
/// by that connection's socket task; across connections no ordering is
/// guaranteed beyond the store's append order.
#[derive(Debug)]
pub struct RelayEngine {
    store: MessageStore,
    registry: ConnectionRegistry,
}

impl RelayEngine {
    /// Creates an engine over the given message store with an empty
    /// connection set.
    #[must_use]
    pub fn new(store: MessageStore) -> Self {
        Self {
            store,
            registry: ConnectionRegistry::new(),
        }
    }

    /// Registers a freshly accepted connection.
    pub async fn handle_connect(&self, id: ConnectionId, outbound: OutboundSender) {
        self.registry.register(id, outbound).await;
        let connections = self.registry.len().await;
        tracing::debug!(%id, connections, "client connected");
    }

    /// Decodes and dispatches one inbound text frame.
    ///
    /// Malformed frames are dropped silently; the connection stays open.
    pub async fn handle_frame(&self, id: ConnectionId, frame: &str) {
        let Some(envelope) = protocol::decode(frame) else {
            tracing::debug!(%id, "dropping undecodable frame");
            return;
        };

        match envelope {
            ClientEnvelope::Join { username } => self.handle_join(id, username).await,
            ClientEnvelope::Message { username, text } => {
                self.handle_message(username, text).await;
            }
            ClientEnvelope::Image {
                username,
                text,
                image,
                image_type,
            } => self.handle_image(username, text, image, image_type).await,
            ClientEnvelope::LoadMore { before_id } => {
                self.handle_load_more(id, before_id).await;
            }
        }
    }

    /// Reaps a closed connection and announces the departure if it had
    /// joined.
    pub async fn handle_disconnect(&self, id: ConnectionId) {
        let Some(username) = self.registry.unregister(id).await else {
            tracing::debug!(%id, "connection closed before joining");
            return;
        };

        tracing::info!(%username, "client left");
        self.registry
            .broadcast_except(id, ServerEnvelope::Leave { username })
            .await;
    }

    /// `join`: record the name, snapshot history to the joiner, announce
    /// to everyone (including the joiner). Re-join overwrites the name and
    /// announces again.
    async fn handle_join(&self, id: ConnectionId, username: String) {
        if username.is_empty() {
            tracing::debug!(%id, "ignoring join with empty username");
            return;
        }

        self.registry.set_name(id, &username).await;

        match self.store.recent(HISTORY_SNAPSHOT_LIMIT).await {
            Ok(messages) => {
                self.registry
                    .send_to(id, ServerEnvelope::History { messages })
                    .await;
            }
            Err(error) => tracing::error!(%id, %error, "failed to load history snapshot"),
        }

        tracing::info!(%username, "client joined");
        self.registry
            .broadcast(ServerEnvelope::Join { username })
            .await;
    }

    /// `message`: persist, then relay verbatim. Join is not a
    /// precondition.
    async fn handle_message(&self, username: String, text: String) {
        if let Err(error) = self.store.append(&username, &text, None, None).await {
            tracing::error!(%error, "message not persisted, suppressing broadcast");
            return;
        }

        self.registry
            .broadcast(ServerEnvelope::Message { username, text })
            .await;
    }

    /// `image`: enforce the payload policy, persist, then relay verbatim.
    /// Policy violations are dropped with a local log only.
    async fn handle_image(
        &self,
        username: String,
        text: Option<String>,
        image: String,
        image_type: String,
    ) {
        if let Err(rejection) = protocol::image::validate(&image, &image_type) {
            tracing::warn!(%username, %rejection, "dropping image frame");
            return;
        }

        let caption = text.as_deref().unwrap_or_default();
        if let Err(error) = self
            .store
            .append(&username, caption, Some(&image), Some(&image_type))
            .await
        {
            tracing::error!(%error, "image not persisted, suppressing broadcast");
            return;
        }

        self.registry
            .broadcast(ServerEnvelope::Image {
                username,
                text,
                image,
                image_type,
            })
            .await;
    }

    /// `load_more`: read-only page query, replied to the requester only.
    async fn handle_load_more(&self, id: ConnectionId, before_id: i64) {
        match self.store.before(before_id, HISTORY_PAGE_LIMIT).await {
            Ok(page) => {
                self.registry
                    .send_to(
                        id,
                        ServerEnvelope::MoreHistory {
                            messages: page.messages,
                            has_more: page.has_more,
                        },
                    )
                    .await;
            }
            Err(error) => tracing::error!(%id, %error, "failed to load history page"),
        }
    }
}
