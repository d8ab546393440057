//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! handing inbound frames to the relay engine and draining the
//! connection's outbound channel onto the socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::domain::ConnectionId;
use crate::relay::RelayEngine;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Inbound text frames are handled to completion, in arrival order.
/// - Outbound envelopes arrive on the connection's channel and are
///   written to the socket; a failed write ends the session.
/// - On close or transport error the connection is unregistered, which
///   announces the departure if the client had joined.
pub async fn run_connection(socket: WebSocket, engine: Arc<RelayEngine>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    let id = ConnectionId::new();
    engine.handle_connect(id, outbound_tx).await;

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => engine.handle_frame(id, &text).await,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            envelope = outbound_rx.recv() => {
                match envelope {
                    Some(envelope) => {
                        let json = serde_json::to_string(&envelope).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    engine.handle_disconnect(id).await;
    tracing::debug!(%id, "ws connection closed");
}
