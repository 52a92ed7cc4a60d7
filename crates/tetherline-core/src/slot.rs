//! Single-slot accessor layered on a multi-listener signal.

use std::marker::PhantomData;

use parking_lot::Mutex;

use crate::signal::{ConnectionId, Signal, Slot};

/// Tracks the single "primary" listener of a [`Signal`].
///
/// A binding emulates an assignable event-handler attribute (`onmessage =
/// handler`) on top of a signal that naturally supports many independent
/// listeners. The primary listener is an ordinary signal connection; the
/// binding merely remembers its [`ConnectionId`] so that rebinding can
/// remove exactly that connection and nothing else.
///
/// Listeners added through [`Signal::connect`] directly ("secondary"
/// listeners) and the primary listener are fully independent: rebinding
/// never disturbs secondary listeners, and disconnecting secondary
/// listeners never affects the primary.
///
/// The binding does not own the signal; callers pass the signal to each
/// operation. The Tetherline client pairs one binding with each of its
/// event signals.
pub struct SlotBinding<Args> {
    primary: Mutex<Option<ConnectionId>>,
    _args: PhantomData<fn(&Args)>,
}

impl<Args> Default for SlotBinding<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> SlotBinding<Args> {
    /// Create a binding with no primary listener installed.
    pub fn new() -> Self {
        Self {
            primary: Mutex::new(None),
            _args: PhantomData,
        }
    }

    /// Install `slot` as the primary listener on `signal`.
    ///
    /// The previously bound primary listener, if any, is disconnected
    /// first. Listeners connected through [`Signal::connect`] are left
    /// untouched. At most one listener ever carries the primary tag.
    pub fn bind<F>(&self, signal: &Signal<Args>, slot: F)
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut primary = self.primary.lock();
        if let Some(old) = primary.take() {
            signal.disconnect(old);
        }
        *primary = Some(signal.connect(slot));
    }

    /// Remove the primary listener, if one is installed.
    ///
    /// Returns `true` if a primary listener was disconnected.
    pub fn unbind(&self, signal: &Signal<Args>) -> bool {
        match self.primary.lock().take() {
            Some(id) => signal.disconnect(id),
            None => false,
        }
    }

    /// Return the currently installed primary listener, or `None`.
    ///
    /// Returns `None` when nothing has been bound, or when the primary
    /// connection was removed behind the binding's back (for example via
    /// [`Signal::disconnect_all`]).
    pub fn current(&self, signal: &Signal<Args>) -> Option<Slot<Args>> {
        self.primary.lock().and_then(|id| signal.slot(id))
    }

    /// Whether a primary listener is currently installed on `signal`.
    pub fn is_bound(&self, signal: &Signal<Args>) -> bool {
        self.current(signal).is_some()
    }
}
