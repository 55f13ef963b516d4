//! Error types reported by the client engine.

use thiserror::Error;

/// Errors surfaced by [`Client`](crate::Client) operations.
///
/// Every variant is also published on the `error` event, so subscribers see
/// the same failures callers get back from `connect`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No host was passed to `connect` and none is configured.
    #[error("No server set.")]
    NoServer,

    /// A session is already connecting, registering or connected.
    #[error("already connected or connecting")]
    AlreadyActive,

    /// The TCP connection could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The socket failed after the session was established.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
}
