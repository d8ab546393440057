//! Relay error types.
//!
//! [`RelayError`] is the central error type for the relay. Per-event and
//! per-connection failures are recovered locally and never tear down the
//! process; there is no HTTP error surface, so no status code mapping exists.

/// Server-side error enum.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Durable message log failure (open, migrate, read or write).
    #[error("persistence error: {0}")]
    Persistence(String),
}
