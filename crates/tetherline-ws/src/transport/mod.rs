//! The transport seam: an opaque capability that opens physical
//! connections.
//!
//! The client never touches sockets, framing, or TLS. It asks a
//! [`Transport`] for a new connection, and a successful [`Transport::open`]
//! *is* the connection's open event. Everything that happens afterwards
//! arrives as [`TransportEvent`]s on the connection's inbound half.
//!
//! The crate ships one production implementation, [`WsTransport`], backed
//! by `tokio-tungstenite`. Tests substitute scripted transports.

mod ws;

pub use ws::WsTransport;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::message::{CloseReason, Payload};

/// An event delivered by an established connection.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// An application message arrived.
    Message(Payload),
    /// The peer closed the connection with the given reason.
    Closed(CloseReason),
    /// The transport faulted mid-session.
    Fault(TransportError),
}

/// Capability that opens a new physical connection to a URL.
///
/// Implementations perform the socket-level work. They classify failures
/// to establish a connection as [`TransportError::ConnectionRefused`];
/// the client treats that class as transient and retries, while every
/// other open failure is surfaced to the application.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new connection to `url`.
    async fn open(&self, url: &str) -> Result<Box<dyn Connection>, TransportError>;
}

/// One established physical connection.
///
/// A connection is consumed by splitting it into an outbound
/// [`MessageSink`] and an inbound [`EventStream`], so the client can
/// select over sending and receiving concurrently. Dropping both halves
/// must release the underlying socket.
pub trait Connection: Send {
    /// Split into independently usable outbound and inbound halves.
    fn split(self: Box<Self>) -> (Box<dyn MessageSink>, Box<dyn EventStream>);
}

/// The outbound half of a connection.
#[async_trait]
pub trait MessageSink: Send {
    /// Transmit one message.
    async fn send(&mut self, payload: Payload) -> Result<(), TransportError>;

    /// Send a close frame with the given reason.
    async fn close(&mut self, reason: CloseReason) -> Result<(), TransportError>;
}

/// The inbound half of a connection.
#[async_trait]
pub trait EventStream: Send {
    /// The next event, or `None` once the connection is spent.
    ///
    /// The client treats end-of-stream without a prior close frame as an
    /// abnormal closure.
    async fn next_event(&mut self) -> Option<TransportEvent>;
}
