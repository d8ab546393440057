//! Persistence layer: the durable SQLite message log.
//!
//! The store is append-only within relay scope: messages are inserted once
//! and never mutated or deleted. Queries are by recency (join snapshot) and
//! by id cursor (pagination).

pub mod sqlite;

pub use sqlite::MessageStore;
