//! Session protocol: envelope types, frame decoding, and payload policy.
//!
//! Sits between the wire transport and the relay engine. Decoding failures
//! are dropped with no error surfaced to the sender; this best-effort
//! policy is deliberate.

pub mod client;
pub mod image;
pub mod server;

pub use client::{ClientEnvelope, decode};
pub use server::ServerEnvelope;
