//! Production transport backed by `tokio-tungstenite`.

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as TungsteniteCloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::{Connection, EventStream, MessageSink, Transport, TransportEvent};
use crate::error::TransportError;
use crate::message::{CloseCode, CloseReason, Payload};

/// Type alias for a connected WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport for `ws://` and `wss://` endpoints.
///
/// Performs the TCP connect, optional TLS, and the WebSocket handshake.
/// Ping frames are answered automatically by the protocol layer.
///
/// # Example
///
/// ```ignore
/// use tetherline_ws::WsTransport;
///
/// let transport = WsTransport::new()
///     .header("Authorization", "Bearer token");
/// ```
#[derive(Clone, Debug, Default)]
pub struct WsTransport {
    /// Custom headers to send during the handshake.
    headers: HashMap<String, String>,
}

impl WsTransport {
    /// Create a transport with no custom handshake headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom header for the WebSocket handshake.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Build the handshake request with custom headers.
    fn build_request(
        &self,
        url: &str,
    ) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, TransportError> {
        let parsed = url::Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme `{}`",
                parsed.scheme()
            )));
        }

        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let headers = request.headers_mut();
        for (name, value) in &self.headers {
            let header_name = http::header::HeaderName::try_from(name.as_str())
                .map_err(|e| TransportError::Transport(format!("invalid header: {e}")))?;
            let header_value = http::header::HeaderValue::try_from(value.as_str())
                .map_err(|e| TransportError::Transport(format!("invalid header: {e}")))?;
            headers.insert(header_name, header_value);
        }

        Ok(request)
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn Connection>, TransportError> {
        let request = self.build_request(url)?;
        match tokio_tungstenite::connect_async(request).await {
            Ok((stream, _response)) => Ok(Box::new(WsConnection { stream })),
            Err(err) => Err(classify_connect_error(&err)),
        }
    }
}

struct WsConnection {
    stream: WsStream,
}

impl Connection for WsConnection {
    fn split(self: Box<Self>) -> (Box<dyn MessageSink>, Box<dyn EventStream>) {
        let (write, read) = self.stream.split();
        (Box::new(WsSink { write }), Box::new(WsEvents { read }))
    }
}

struct WsSink {
    write: SplitSink<WsStream, Message>,
}

#[async_trait]
impl MessageSink for WsSink {
    async fn send(&mut self, payload: Payload) -> Result<(), TransportError> {
        let message = match payload {
            Payload::Text(text) => Message::Text(text.into()),
            Payload::Binary(data) => Message::Binary(data.into()),
        };
        self.write
            .send(message)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self, reason: CloseReason) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: TungsteniteCloseCode::from(reason.code.as_u16()),
            reason: reason.reason.unwrap_or_default().into(),
        };
        self.write
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| TransportError::Transport(e.to_string()))
    }
}

struct WsEvents {
    read: SplitStream<WsStream>,
}

#[async_trait]
impl EventStream for WsEvents {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            match self.read.next().await? {
                Ok(message) => {
                    if let Some(event) = event_from_message(message) {
                        return Some(event);
                    }
                    // Ping/pong/raw frames are protocol noise; keep reading.
                }
                Err(err) => return Some(event_from_error(err)),
            }
        }
    }
}

/// Map a protocol message onto a transport event, or `None` for frames
/// the client never sees (ping/pong handling lives in tungstenite).
fn event_from_message(message: Message) -> Option<TransportEvent> {
    match message {
        Message::Text(text) => Some(TransportEvent::Message(Payload::Text(text.to_string()))),
        Message::Binary(data) => Some(TransportEvent::Message(Payload::Binary(data.to_vec()))),
        Message::Close(frame) => Some(TransportEvent::Closed(close_reason_from_frame(frame))),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

fn close_reason_from_frame(frame: Option<CloseFrame>) -> CloseReason {
    match frame {
        Some(frame) => CloseReason {
            code: CloseCode::from_u16(u16::from(frame.code)),
            reason: (!frame.reason.is_empty()).then(|| frame.reason.to_string()),
        },
        None => CloseReason::new(CloseCode::NoStatus),
    }
}

/// A torn TCP connection without a closing handshake is the protocol's
/// abnormal closure (1006); everything else is a session fault.
fn event_from_error(err: WsError) -> TransportEvent {
    match err {
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => TransportEvent::Closed(
            CloseReason::with_reason(CloseCode::Abnormal, "connection reset"),
        ),
        other => TransportEvent::Fault(TransportError::Transport(other.to_string())),
    }
}

fn classify_connect_error(err: &WsError) -> TransportError {
    match err {
        WsError::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
            TransportError::ConnectionRefused(io.to_string())
        }
        WsError::Url(err) => TransportError::InvalidUrl(err.to_string()),
        other => TransportError::Transport(other.to_string()),
    }
}
