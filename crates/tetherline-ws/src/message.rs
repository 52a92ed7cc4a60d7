//! Message payloads, close codes, and connection state.

use std::fmt;

/// Current state of the logical connection.
///
/// Emitted on the client's `state_changed` signal on every transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SocketState {
    /// Not connected and not trying to be.
    #[default]
    Disconnected,
    /// Currently attempting to connect.
    Connecting,
    /// Connected; sends and message delivery are valid.
    Connected,
    /// Connection lost abnormally; waiting out the reconnect interval.
    Reconnecting,
}

/// An outbound or inbound message payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// A UTF-8 text message.
    Text(String),
    /// A binary message.
    Binary(Vec<u8>),
}

impl Payload {
    /// The payload as text, if it is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// The payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(data) => data.len(),
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self::Binary(data)
    }
}

/// A received message tagged with its sequence number.
///
/// Sequence numbers start at 1 for the first message the client ever
/// receives and increase by exactly one per message for the lifetime of
/// the client; they are never reset by a reconnect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// The message payload.
    pub payload: Payload,
    /// Position of this message in the client's lifetime delivery order.
    pub seq: u64,
}

/// Standard WebSocket close codes as defined in RFC 6455.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CloseCode {
    /// Normal closure; the connection successfully completed.
    #[default]
    Normal,
    /// Endpoint is going away (e.g., server shutting down).
    Away,
    /// Protocol error occurred.
    Protocol,
    /// Received data type that cannot be accepted.
    Unsupported,
    /// No status code was provided.
    NoStatus,
    /// Connection was closed abnormally (no close frame received).
    Abnormal,
    /// Received data inconsistent with the message type.
    Invalid,
    /// Policy violation.
    Policy,
    /// Message too big to process.
    TooBig,
    /// Extension negotiation failed.
    Extension,
    /// Unexpected condition prevented the request from being fulfilled.
    Error,
    /// Server is restarting.
    Restart,
    /// Server is too busy; try again later.
    Again,
    /// Any other close code, including application-specific codes in the
    /// 4000-4999 range.
    Other(u16),
}

impl CloseCode {
    /// Convert to the numeric close code.
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::Away => 1001,
            Self::Protocol => 1002,
            Self::Unsupported => 1003,
            Self::NoStatus => 1005,
            Self::Abnormal => 1006,
            Self::Invalid => 1007,
            Self::Policy => 1008,
            Self::TooBig => 1009,
            Self::Extension => 1010,
            Self::Error => 1011,
            Self::Restart => 1012,
            Self::Again => 1013,
            Self::Other(code) => *code,
        }
    }

    /// Create from a numeric close code.
    pub fn from_u16(code: u16) -> Self {
        match code {
            1000 => Self::Normal,
            1001 => Self::Away,
            1002 => Self::Protocol,
            1003 => Self::Unsupported,
            1005 => Self::NoStatus,
            1006 => Self::Abnormal,
            1007 => Self::Invalid,
            1008 => Self::Policy,
            1009 => Self::TooBig,
            1010 => Self::Extension,
            1011 => Self::Error,
            1012 => Self::Restart,
            1013 => Self::Again,
            code => Self::Other(code),
        }
    }

    /// Whether this is the protocol's designated normal-closure code.
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Normal)
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Reason for closing a connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CloseReason {
    /// The close status code.
    pub code: CloseCode,
    /// Optional human-readable reason string.
    pub reason: Option<String>,
}

impl CloseReason {
    /// Create a close reason with just a code.
    pub fn new(code: CloseCode) -> Self {
        Self { code, reason: None }
    }

    /// Create a close reason with a code and message.
    pub fn with_reason(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: Some(reason.into()),
        }
    }

    /// Create a normal close reason.
    pub fn normal() -> Self {
        Self::new(CloseCode::Normal)
    }
}
