//! Domain layer: connection identity, the chat message model, and the
//! live connection registry.

pub mod connection_id;
pub mod message;
pub mod registry;

pub use connection_id::ConnectionId;
pub use message::{ChatMessage, HistoryPage};
pub use registry::{ConnectionRegistry, OutboundSender};
