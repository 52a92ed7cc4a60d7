//! Core listener mechanism for Tetherline.
//!
//! This crate provides the two building blocks the Tetherline client is
//! wired with:
//!
//! - **Signal/Slot System**: a type-safe, multi-listener notification
//!   mechanism. Any number of slots (closures) can be connected to a
//!   [`Signal`] and all of them are invoked on every emission.
//! - **Slot Binding**: a single-slot accessor layered on top of a signal.
//!   A [`SlotBinding`] tracks at most one "primary" listener; rebinding it
//!   replaces only that listener and never touches slots connected through
//!   the generic [`Signal::connect`] mechanism. This gives W3C-style
//!   `onmessage = handler` ergonomics without losing multi-listener
//!   subscription.
//!
//! # Signal Example
//!
//! ```
//! use tetherline_core::Signal;
//!
//! let message_received = Signal::<String>::new();
//!
//! let conn_id = message_received.connect(|text| {
//!     println!("received: {}", text);
//! });
//!
//! message_received.emit("hello".to_string());
//! message_received.disconnect(conn_id);
//! ```
//!
//! # Slot Binding Example
//!
//! ```
//! use tetherline_core::{Signal, SlotBinding};
//!
//! let message_received = Signal::<String>::new();
//! let on_message = SlotBinding::new();
//!
//! // A secondary listener, independent of the binding.
//! message_received.connect(|text| println!("observer: {}", text));
//!
//! // Installing a primary handler twice replaces only the primary.
//! on_message.bind(&message_received, |text| println!("first: {}", text));
//! on_message.bind(&message_received, |text| println!("second: {}", text));
//!
//! // Fires "observer" and "second", exactly once each.
//! message_received.emit("hello".to_string());
//! ```

mod signal;
mod slot;

pub use signal::{ConnectionId, Signal, Slot};
pub use slot::SlotBinding;
