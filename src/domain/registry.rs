//! Live connection registry.
//!
//! [`ConnectionRegistry`] owns the mapping from connection token to claimed
//! display name and outbound channel. It is mutated on connect, `join` and
//! disconnect, and read by every fan-out.
//!
//! # Concurrency
//!
//! - The map sits behind a [`tokio::sync::RwLock`].
//! - Fan-out snapshots the outbound senders under the read lock, then sends
//!   with the lock released, so connections may be added or removed while a
//!   broadcast is in flight without missed or duplicated deliveries.
//! - A send to a closed channel is skipped and never aborts the loop; the
//!   dead connection is reaped by its own socket task on close.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};

use super::ConnectionId;
use crate::protocol::ServerEnvelope;

/// Outbound channel handle for one connection.
///
/// Unbounded so that fan-out never blocks on a slow peer; the socket task
/// drains the channel and writes frames to the transport.
pub type OutboundSender = mpsc::UnboundedSender<ServerEnvelope>;

/// Registry entry for one live connection.
#[derive(Debug)]
struct ConnectionEntry {
    /// Display name claimed via `join`; `None` until then.
    display_name: Option<String>,
    /// Channel to the connection's socket task.
    outbound: OutboundSender,
}

/// Central store for all live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection with no display name.
    ///
    /// Idempotent per id: re-registering a known id replaces its entry.
    pub async fn register(&self, id: ConnectionId, outbound: OutboundSender) {
        let mut map = self.connections.write().await;
        map.insert(
            id,
            ConnectionEntry {
                display_name: None,
                outbound,
            },
        );
    }

    /// Assigns or overwrites the display name for a registered connection.
    ///
    /// Unknown ids are ignored; the protocol layer has already dropped
    /// empty names before this point.
    pub async fn set_name(&self, id: ConnectionId, name: &str) {
        let mut map = self.connections.write().await;
        if let Some(entry) = map.get_mut(&id) {
            entry.display_name = Some(name.to_string());
        }
    }

    /// Removes a connection, returning its last known display name.
    ///
    /// Returns `None` if the connection never joined (or was not
    /// registered), so the caller can decide whether to announce a
    /// departure.
    pub async fn unregister(&self, id: ConnectionId) -> Option<String> {
        let mut map = self.connections.write().await;
        map.remove(&id).and_then(|entry| entry.display_name)
    }

    /// Delivers an envelope to a single connection.
    ///
    /// A missing or closed connection is skipped silently.
    pub async fn send_to(&self, id: ConnectionId, envelope: ServerEnvelope) {
        let map = self.connections.read().await;
        if let Some(entry) = map.get(&id) {
            let _ = entry.outbound.send(envelope);
        }
    }

    /// Delivers an envelope to every registered connection.
    pub async fn broadcast(&self, envelope: ServerEnvelope) {
        let senders = self.snapshot(None).await;
        for sender in senders {
            let _ = sender.send(envelope.clone());
        }
    }

    /// Delivers an envelope to every registered connection except one.
    ///
    /// Used for leave announcements, which exclude the departing
    /// connection itself.
    pub async fn broadcast_except(&self, except: ConnectionId, envelope: ServerEnvelope) {
        let senders = self.snapshot(Some(except)).await;
        for sender in senders {
            let _ = sender.send(envelope.clone());
        }
    }

    /// Returns the number of live connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Returns `true` if no connections are registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Copies the outbound senders out of the map so sends happen with the
    /// lock released.
    async fn snapshot(&self, except: Option<ConnectionId>) -> Vec<OutboundSender> {
        let map = self.connections.read().await;
        map.iter()
            .filter(|(id, _)| Some(**id) != except)
            .map(|(_, entry)| entry.outbound.clone())
            .collect()
    }
}
