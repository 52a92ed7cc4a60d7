//! Resilient WebSocket client for Tetherline.
//!
//! This crate wraps a WebSocket transport in a [`ReconnectingClient`]
//! that owns one logical connection across any number of physical
//! connections. The client connects on construction and keeps itself
//! connected: abnormal closures and connection-refused errors schedule a
//! reconnect after a fixed interval, forever, until a normal closure or
//! an explicit close. Sends are fire-and-forget; every failure surfaces
//! as an event on the error channel instead of a return value.
//!
//! Events are delivered through [`Signal`]s from `tetherline-core`: each
//! channel supports any number of connected listeners plus one
//! assignable primary handler.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tetherline_ws::{ClientConfig, ReconnectingClient, WsTransport};
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = Arc::new(WsTransport::new());
//!     let client = ReconnectingClient::new(ClientConfig::new("ws://localhost:6000/", transport));
//!
//!     client.set_on_open(|_| println!("connected"));
//!     client.set_on_message(|message| {
//!         println!("message #{}: {:?}", message.seq, message.payload);
//!     });
//!     client.set_on_error(|err| eprintln!("error: {err}"));
//!
//!     client.send("Hello World!");
//! }
//! ```

mod client;
mod error;
mod message;
mod normalize;
pub mod transport;

pub use client::{ClientConfig, ClientEvents, ReconnectingClient, DEFAULT_RECONNECT_INTERVAL};
pub use error::{Result, TransportError};
pub use message::{CloseCode, CloseReason, InboundMessage, Payload, SocketState};
pub use transport::WsTransport;

pub use tetherline_core::{ConnectionId, Signal, Slot, SlotBinding};
