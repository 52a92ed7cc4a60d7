//! Error types for the Tetherline client.

use thiserror::Error;

/// Transport-level failures, as surfaced through the client's error
/// channel.
///
/// The client itself never returns or panics on these; every failure is
/// either consumed by the reconnect machinery (connection-refused class)
/// or emitted on the `errored` signal for the application to observe.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The transport could not establish a connection at all.
    ///
    /// Treated as transient: the client schedules a reconnect and does
    /// not surface this variant as an error event.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// The URL could not be parsed or does not name a WebSocket endpoint.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A send was attempted while no connection was live.
    #[error("not connected")]
    NotConnected,

    /// The transport failed to transmit an outbound message.
    #[error("send failed: {0}")]
    Send(String),

    /// Any other transport failure, during connect or an established
    /// session.
    #[error("transport error: {0}")]
    Transport(String),
}

impl TransportError {
    /// Whether this error means the transport could not establish a
    /// connection at all (as opposed to a failure during an established
    /// session).
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, Self::ConnectionRefused(_))
    }
}

/// A specialized Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
