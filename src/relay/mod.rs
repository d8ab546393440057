//! Relay layer: event dispatch, persistence gating, and fan-out.

pub mod engine;

pub use engine::RelayEngine;
