//! # aurora-relay
//!
//! WebSocket relay and message history store for the Aurora group chat.
//! Clients connect over a persistent WebSocket, announce a display name,
//! exchange text and image messages, and receive a paginated history of
//! prior messages on join.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)
//!     │
//!     ├── WS transport (ws/)
//!     │
//!     ├── Session protocol (protocol/)
//!     ├── RelayEngine (relay/)
//!     │
//!     ├── ConnectionRegistry (domain/)
//!     └── SQLite message log (persistence/)
//! ```
//!
//! Inbound frames are decoded by the session protocol, dispatched by the
//! relay engine (persist first, then fan out), and delivered through
//! per-connection channels held by the registry. Display names are
//! untrusted by design; the relay has no authentication.

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod protocol;
pub mod relay;
pub mod ws;
