//! Event normalization: collapse the transport's close-code and error
//! vocabularies into a single retry-or-surface decision, and tag inbound
//! messages with their lifetime sequence number.
//!
//! The reconnect state machine only ever needs two exit branches per
//! fault event, so everything the transport can report is reduced here
//! to one of them before the client acts on it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::TransportError;
use crate::message::CloseCode;

/// What the client does after the peer closes the connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CloseDisposition {
    /// Normal closure: surface the close event and stop.
    Final,
    /// Abnormal closure: schedule a reconnect, then still surface the
    /// close event.
    Retry,
}

/// Classify a close code.
pub(crate) fn close_disposition(code: CloseCode) -> CloseDisposition {
    if code.is_normal() {
        CloseDisposition::Final
    } else {
        CloseDisposition::Retry
    }
}

/// What the client does with a transport error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FaultDisposition {
    /// Connection-refused class: schedule a reconnect; the retry is the
    /// handling, so no error event is emitted.
    Retry,
    /// Anything else: surface as an error event, no recovery attempted.
    Surface,
}

/// Classify a transport error.
pub(crate) fn fault_disposition(error: &TransportError) -> FaultDisposition {
    if error.is_connection_refused() {
        FaultDisposition::Retry
    } else {
        FaultDisposition::Surface
    }
}

/// Lifetime counter for received messages.
///
/// Monotonically increasing, starts at zero, incremented exactly once
/// per received message. Deliberately shared across reconnects so that
/// observers see one uninterrupted ordering for the logical connection.
#[derive(Debug, Default)]
pub(crate) struct MessageSequence(AtomicU64);

impl MessageSequence {
    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Count one message and return its 1-based sequence number.
    pub(crate) fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of messages counted so far.
    pub(crate) fn count(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_close_is_final_everything_else_retries() {
        assert_eq!(close_disposition(CloseCode::Normal), CloseDisposition::Final);
        for code in [1001, 1002, 1005, 1006, 1011, 4000] {
            assert_eq!(
                close_disposition(CloseCode::from_u16(code)),
                CloseDisposition::Retry,
                "code {code}"
            );
        }
    }

    #[test]
    fn only_refused_errors_retry() {
        assert_eq!(
            fault_disposition(&TransportError::ConnectionRefused("ECONNREFUSED".into())),
            FaultDisposition::Retry
        );
        assert_eq!(
            fault_disposition(&TransportError::Send("broken pipe".into())),
            FaultDisposition::Surface
        );
        assert_eq!(
            fault_disposition(&TransportError::Transport("protocol violation".into())),
            FaultDisposition::Surface
        );
        assert_eq!(
            fault_disposition(&TransportError::NotConnected),
            FaultDisposition::Surface
        );
    }

    #[test]
    fn sequence_is_one_based_and_monotonic() {
        let sequence = MessageSequence::new();
        assert_eq!(sequence.count(), 0);
        assert_eq!(sequence.next(), 1);
        assert_eq!(sequence.next(), 2);
        assert_eq!(sequence.next(), 3);
        assert_eq!(sequence.count(), 3);
    }
}
