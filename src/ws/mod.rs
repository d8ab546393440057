//! WebSocket transport layer: the upgrade endpoint and the per-socket
//! read/write loop.
//!
//! The endpoint at `/ws` is the relay's only surface; every client holds
//! one persistent connection carrying JSON text frames.

pub mod connection;
pub mod handler;
