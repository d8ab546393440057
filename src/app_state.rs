//! Shared application state injected into the transport handler.

use std::sync::Arc;

use crate::relay::RelayEngine;

/// Shared application state available to the WebSocket handler via
/// Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay engine owning the message store and the live connection set.
    pub engine: Arc<RelayEngine>,
}
