//! Signal/slot system for Tetherline.
//!
//! Signals are the notification backbone of the client: each public event
//! channel (opened, message, error, closed, state changes) is a
//! [`Signal`], and slots (closures) connected to it are invoked in
//! connection order on every emission.
//!
//! Slots run on the emitting thread. The Tetherline client emits all of
//! its signals from a single connection task, so slots observe events one
//! at a time, in delivery order; the signal itself is `Send + Sync` and
//! may be connected to or emitted from any thread.
//!
//! # Example
//!
//! ```
//! use tetherline_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via
    /// [`Signal::disconnect`]. The ID remains valid until the connection
    /// is explicitly disconnected or the signal is dropped; identifiers
    /// are versioned, so an ID is never silently reused for a listener it
    /// did not create.
    pub struct ConnectionId;
}

/// A connected slot: a shared, thread-safe closure over the signal's
/// argument type.
pub type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal that can have multiple connected slots.
///
/// When a signal is emitted, every connected slot is invoked with a
/// reference to the provided arguments, in the order the slots were
/// connected.
///
/// # Type Parameter
///
/// - `Args`: the argument type passed to connected slots. Use `()` for
///   signals with no arguments.
///
/// # Related Types
///
/// - [`ConnectionId`] - returned by [`connect`](Self::connect), used to disconnect
/// - [`crate::SlotBinding`] - single-slot accessor layered on a signal
pub struct Signal<Args> {
    /// All active connections, in insertion order.
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a [`ConnectionId`] that can be used to disconnect the slot
    /// later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false`
    /// otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Look up the slot registered under a connection ID.
    ///
    /// Returns `None` if the connection has been disconnected. Used by
    /// [`crate::SlotBinding`] to report its current primary handler.
    pub fn slot(&self, id: ConnectionId) -> Option<Slot<Args>> {
        self.connections.lock().get(id).cloned()
    }

    /// Emit the signal, invoking all connected slots.
    ///
    /// Slots are invoked after the internal listener lock is released, so
    /// a slot may connect or disconnect listeners on the same signal
    /// without deadlocking. Listener changes made by a slot take effect
    /// from the next emission.
    pub fn emit(&self, args: Args) {
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(
            target: "tetherline_core::signal",
            connection_count = slots.len(),
            "emitting signal"
        );
        for slot in slots {
            slot(&args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[test]
    fn connect_and_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(42);
        signal.emit(100);

        let values = received.lock();
        assert_eq!(*values, vec![42, 100]);
    }

    #[test]
    fn disconnect_stops_delivery() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let conn_id = signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(1);
        assert!(signal.disconnect(conn_id));
        signal.emit(2);

        let values = received.lock();
        assert_eq!(*values, vec![1]); // Only received before disconnect
    }

    #[test]
    fn disconnect_unknown_id_is_false() {
        let signal = Signal::<i32>::new();
        let conn_id = signal.connect(|_| {});
        assert!(signal.disconnect(conn_id));
        assert!(!signal.disconnect(conn_id));
    }

    #[test]
    fn multiple_connections_all_fire() {
        let signal = Signal::<String>::new();
        let count = Arc::new(Mutex::new(0));

        for _ in 0..3 {
            let count_clone = count.clone();
            signal.connect(move |_| {
                *count_clone.lock() += 1;
            });
        }

        assert_eq!(signal.connection_count(), 3);
        signal.emit("test".to_string());
        assert_eq!(*count.lock(), 3);
    }

    #[test]
    fn disconnect_all_clears_listeners() {
        let signal = Signal::<()>::new();

        for _ in 0..5 {
            signal.connect(|_| {});
        }

        assert_eq!(signal.connection_count(), 5);
        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn slot_lookup_by_id() {
        let signal = Signal::<i32>::new();
        let hit = Arc::new(AtomicBool::new(false));

        let hit_clone = hit.clone();
        let conn_id = signal.connect(move |_| {
            hit_clone.store(true, Ordering::SeqCst);
        });

        let slot = signal.slot(conn_id).expect("slot should be registered");
        slot(&7);
        assert!(hit.load(Ordering::SeqCst));

        signal.disconnect(conn_id);
        assert!(signal.slot(conn_id).is_none());
    }

    #[test]
    fn emit_with_no_args() {
        let signal = Signal::<()>::new();
        let called = Arc::new(AtomicBool::new(false));

        let called_clone = called.clone();
        signal.connect(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        signal.emit(());
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn slot_may_reconnect_during_emit() {
        // Reconnecting from inside a slot must not deadlock; the change
        // applies from the next emission.
        let signal = Arc::new(Signal::<i32>::new());
        let count = Arc::new(AtomicUsize::new(0));

        let signal_clone = signal.clone();
        let count_clone = count.clone();
        signal.connect(move |_| {
            let inner_count = count_clone.clone();
            signal_clone.connect(move |_| {
                inner_count.fetch_add(1, Ordering::SeqCst);
            });
        });

        signal.emit(1); // connects one new slot, fires none of them
        assert_eq!(count.load(Ordering::SeqCst), 0);
        signal.emit(2); // the slot added during the first emit now fires
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn emit_from_multiple_threads() {
        let signal = Arc::new(Signal::<i32>::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        let mut handles = vec![];
        for i in 0..10 {
            let signal_clone = signal.clone();
            handles.push(std::thread::spawn(move || {
                signal_clone.emit(i);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let values = received.lock();
        assert_eq!(values.len(), 10);
        for i in 0..10 {
            assert!(values.contains(&i), "Missing value {}", i);
        }
    }
}
