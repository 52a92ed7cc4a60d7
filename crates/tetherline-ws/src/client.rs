//! Reconnecting WebSocket client with signal-based event delivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tetherline_core::{Signal, Slot, SlotBinding};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::message::{CloseCode, CloseReason, InboundMessage, Payload, SocketState};
use crate::normalize::{self, CloseDisposition, FaultDisposition, MessageSequence};
use crate::transport::{Transport, TransportEvent};

/// Fixed delay between reconnect attempts, unless configured otherwise.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(5000);

/// Configuration for a [`ReconnectingClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// The endpoint URL. Immutable after construction.
    url: String,
    /// The capability that opens physical connections.
    transport: Arc<dyn Transport>,
    /// Fixed delay between reconnect attempts. There is deliberately no
    /// backoff growth and no attempt cap.
    reconnect_interval: Duration,
}

impl ClientConfig {
    /// Create a configuration for the given URL and transport.
    pub fn new(url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            url: url.into(),
            transport,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }

    /// Set the fixed reconnect interval (default 5000 ms).
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }
}

/// The client's public event channels.
///
/// Any number of listeners can be connected to each signal through
/// [`Signal::connect`]; these are independent of the single-slot
/// accessors on [`ReconnectingClient`].
pub struct ClientEvents {
    /// Emitted when a connection is established.
    pub opened: Signal<()>,
    /// Emitted for every received message, tagged with its sequence
    /// number.
    pub message: Signal<InboundMessage>,
    /// Emitted for surfaced transport errors, including failed sends.
    pub errored: Signal<TransportError>,
    /// Emitted when the connection closes, normally or abnormally.
    pub closed: Signal<CloseReason>,
    /// Emitted on every connection state transition.
    pub state_changed: Signal<SocketState>,
}

impl ClientEvents {
    fn new() -> Self {
        Self {
            opened: Signal::new(),
            message: Signal::new(),
            errored: Signal::new(),
            closed: Signal::new(),
            state_changed: Signal::new(),
        }
    }
}

/// Primary-listener bindings for the four public event channels.
struct ClientSlots {
    opened: SlotBinding<()>,
    message: SlotBinding<InboundMessage>,
    errored: SlotBinding<TransportError>,
    closed: SlotBinding<CloseReason>,
}

impl ClientSlots {
    fn new() -> Self {
        Self {
            opened: SlotBinding::new(),
            message: SlotBinding::new(),
            errored: SlotBinding::new(),
            closed: SlotBinding::new(),
        }
    }
}

/// Command sent to the connection task.
enum Command {
    Send(Payload),
    Close(CloseReason),
}

/// How a session ended, from the reconnect machine's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Terminal: no reconnect.
    Final,
    /// Transient fault: wait out the interval, then connect again.
    Retry,
}

/// A client that owns one logical connection across any number of
/// physical connections.
///
/// The client connects on construction and keeps itself connected: an
/// abnormal closure or a connection-refused error schedules a reconnect
/// after a fixed interval, forever, until a normal closure or an
/// explicit [`close`](Self::close). Application code never handles a
/// connection error inline; every failure arrives on the `errored`
/// signal.
///
/// # Events
///
/// Each of the four channels (`opened`, `message`, `errored`, `closed`)
/// can be observed two ways, independently:
///
/// - any number of listeners via [`events`](Self::events) and
///   [`Signal::connect`];
/// - one assignable "primary" handler via the `set_on_*` accessors,
///   which replace only the previously assigned primary handler.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tetherline_ws::{ClientConfig, ReconnectingClient, WsTransport};
///
/// let config = ClientConfig::new("ws://localhost:6000/", Arc::new(WsTransport::new()));
/// let client = ReconnectingClient::new(config);
///
/// client.events().message.connect(|message| {
///     println!("message #{}: {:?}", message.seq, message.payload);
/// });
/// client.set_on_open(|_| println!("connected"));
///
/// client.send("Hello World!");
/// ```
///
/// # Runtime
///
/// Must be constructed inside a tokio runtime; the connection lifecycle
/// runs on one spawned task, so all event callbacks are invoked one at a
/// time, in delivery order.
pub struct ReconnectingClient {
    config: ClientConfig,
    state: Arc<Mutex<SocketState>>,
    sequence: Arc<MessageSequence>,
    command_tx: Arc<Mutex<Option<mpsc::UnboundedSender<Command>>>>,
    is_running: Arc<AtomicBool>,
    events: Arc<ClientEvents>,
    slots: ClientSlots,
}

impl ReconnectingClient {
    /// Create a client and immediately open the connection.
    pub fn new(config: ClientConfig) -> Self {
        let client = Self {
            config,
            state: Arc::new(Mutex::new(SocketState::Disconnected)),
            sequence: Arc::new(MessageSequence::new()),
            command_tx: Arc::new(Mutex::new(None)),
            is_running: Arc::new(AtomicBool::new(false)),
            events: Arc::new(ClientEvents::new()),
            slots: ClientSlots::new(),
        };
        client.open();
        client
    }

    /// Start the connection task.
    ///
    /// A no-op while the client is already running. After a terminal stop
    /// (normal closure or [`close`](Self::close)) this starts a fresh
    /// connection with fresh wiring; the message sequence is not reset.
    pub fn open(&self) {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return; // Already running
        }

        let task = ConnectionTask {
            url: self.config.url.clone(),
            transport: Arc::clone(&self.config.transport),
            reconnect_interval: self.config.reconnect_interval,
            state: Arc::clone(&self.state),
            sequence: Arc::clone(&self.sequence),
            command_tx: Arc::clone(&self.command_tx),
            is_running: Arc::clone(&self.is_running),
            events: Arc::clone(&self.events),
        };
        tokio::spawn(task.run());
    }

    /// Send a message.
    ///
    /// Fire-and-forget: this never returns an error and never panics on
    /// transport failure. A failed or impossible send is re-emitted as
    /// exactly one event on the `errored` signal, so error handling is
    /// unified on one channel.
    pub fn send(&self, payload: impl Into<Payload>) {
        let delivered = {
            let command_tx = self.command_tx.lock();
            match command_tx.as_ref() {
                Some(tx) => tx.send(Command::Send(payload.into())).is_ok(),
                None => false,
            }
        };
        if !delivered {
            self.events.errored.emit(TransportError::NotConnected);
        }
    }

    /// Close the connection and stop reconnecting.
    ///
    /// Requests a normal transport-level close when connected, and clears
    /// the running flag so that a reconnect pending in the wait interval
    /// is abandoned instead of dialing again. [`open`](Self::open) can
    /// restart a closed client.
    pub fn close(&self) {
        if let Some(tx) = self.command_tx.lock().as_ref() {
            let _ = tx.send(Command::Close(CloseReason::normal()));
        }
        self.is_running.store(false, Ordering::SeqCst);
    }

    /// The URL this client connects to.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// The current connection state.
    pub fn state(&self) -> SocketState {
        *self.state.lock()
    }

    /// Whether the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.state() == SocketState::Connected
    }

    /// Total number of messages received over the client's lifetime,
    /// across all physical connections.
    pub fn messages_received(&self) -> u64 {
        self.sequence.count()
    }

    /// The client's event channels, for multi-listener subscription.
    pub fn events(&self) -> &ClientEvents {
        &self.events
    }

    /// Install the primary open handler, replacing any previous one.
    pub fn set_on_open<F>(&self, handler: F)
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.slots.opened.bind(&self.events.opened, handler);
    }

    /// The primary open handler, if one is installed.
    pub fn on_open(&self) -> Option<Slot<()>> {
        self.slots.opened.current(&self.events.opened)
    }

    /// Remove the primary open handler.
    pub fn clear_on_open(&self) {
        self.slots.opened.unbind(&self.events.opened);
    }

    /// Install the primary message handler, replacing any previous one.
    pub fn set_on_message<F>(&self, handler: F)
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.slots.message.bind(&self.events.message, handler);
    }

    /// The primary message handler, if one is installed.
    pub fn on_message(&self) -> Option<Slot<InboundMessage>> {
        self.slots.message.current(&self.events.message)
    }

    /// Remove the primary message handler.
    pub fn clear_on_message(&self) {
        self.slots.message.unbind(&self.events.message);
    }

    /// Install the primary error handler, replacing any previous one.
    pub fn set_on_error<F>(&self, handler: F)
    where
        F: Fn(&TransportError) + Send + Sync + 'static,
    {
        self.slots.errored.bind(&self.events.errored, handler);
    }

    /// The primary error handler, if one is installed.
    pub fn on_error(&self) -> Option<Slot<TransportError>> {
        self.slots.errored.current(&self.events.errored)
    }

    /// Remove the primary error handler.
    pub fn clear_on_error(&self) {
        self.slots.errored.unbind(&self.events.errored);
    }

    /// Install the primary close handler, replacing any previous one.
    pub fn set_on_close<F>(&self, handler: F)
    where
        F: Fn(&CloseReason) + Send + Sync + 'static,
    {
        self.slots.closed.bind(&self.events.closed, handler);
    }

    /// The primary close handler, if one is installed.
    pub fn on_close(&self) -> Option<Slot<CloseReason>> {
        self.slots.closed.current(&self.events.closed)
    }

    /// Remove the primary close handler.
    pub fn clear_on_close(&self) {
        self.slots.closed.unbind(&self.events.closed);
    }
}

impl std::fmt::Debug for ReconnectingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectingClient")
            .field("url", &self.config.url)
            .field("state", &self.state())
            .finish()
    }
}

/// The connection task: owns the live connection, runs the reconnect
/// machine.
struct ConnectionTask {
    url: String,
    transport: Arc<dyn Transport>,
    reconnect_interval: Duration,
    state: Arc<Mutex<SocketState>>,
    sequence: Arc<MessageSequence>,
    command_tx: Arc<Mutex<Option<mpsc::UnboundedSender<Command>>>>,
    is_running: Arc<AtomicBool>,
    events: Arc<ClientEvents>,
}

impl ConnectionTask {
    async fn run(self) {
        loop {
            match self.session().await {
                SessionEnd::Final => break,
                SessionEnd::Retry => {
                    self.set_state(SocketState::Reconnecting);
                    tracing::info!(
                        target: "tetherline_ws::client",
                        url = %self.url,
                        interval_ms = self.reconnect_interval.as_millis() as u64,
                        "reconnecting after interval"
                    );
                    tokio::time::sleep(self.reconnect_interval).await;
                    if !self.is_running.load(Ordering::SeqCst) {
                        break; // close() arrived during the wait
                    }
                }
            }
        }
        self.set_state(SocketState::Disconnected);
        self.is_running.store(false, Ordering::SeqCst);
    }

    /// Dial once and pump the connection until it ends.
    async fn session(&self) -> SessionEnd {
        self.set_state(SocketState::Connecting);

        let connection = match self.transport.open(&self.url).await {
            Ok(connection) => connection,
            Err(err) => {
                return match normalize::fault_disposition(&err) {
                    FaultDisposition::Retry => {
                        // The retry is the handling; refused errors are
                        // never surfaced as error events.
                        tracing::warn!(
                            target: "tetherline_ws::client",
                            url = %self.url,
                            error = %err,
                            "connection refused"
                        );
                        SessionEnd::Retry
                    }
                    FaultDisposition::Surface => {
                        tracing::warn!(
                            target: "tetherline_ws::client",
                            url = %self.url,
                            error = %err,
                            "connection attempt failed"
                        );
                        self.events.errored.emit(err);
                        SessionEnd::Final
                    }
                };
            }
        };

        let (mut sink, mut stream) = connection.split();

        if !self.is_running.load(Ordering::SeqCst) {
            // close() raced the dial; shut the fresh connection down.
            let _ = sink.close(CloseReason::normal()).await;
            self.events.closed.emit(CloseReason::normal());
            return SessionEnd::Final;
        }

        self.set_state(SocketState::Connected);
        self.events.opened.emit(());

        let (tx, mut rx) = mpsc::unbounded_channel();
        *self.command_tx.lock() = Some(tx);

        let end = loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Send(payload)) => {
                        // A failed send surfaces on the error channel,
                        // never to the caller; the session stays up.
                        if let Err(err) = sink.send(payload).await {
                            tracing::warn!(
                                target: "tetherline_ws::client",
                                error = %err,
                                "send failed"
                            );
                            self.events.errored.emit(err);
                        }
                    }
                    Some(Command::Close(reason)) => {
                        let _ = sink.close(reason.clone()).await;
                        self.events.closed.emit(reason);
                        break SessionEnd::Final;
                    }
                    None => break SessionEnd::Final,
                },
                event = stream.next_event() => match event {
                    Some(TransportEvent::Message(payload)) => {
                        let seq = self.sequence.next();
                        self.events.message.emit(InboundMessage { payload, seq });
                    }
                    Some(TransportEvent::Closed(reason)) => break self.on_close(reason),
                    Some(TransportEvent::Fault(err)) => match normalize::fault_disposition(&err) {
                        FaultDisposition::Retry => break SessionEnd::Retry,
                        FaultDisposition::Surface => {
                            // Surfaced, not acted on; if the session is
                            // really gone the transport reports closure
                            // separately.
                            self.events.errored.emit(err);
                        }
                    },
                    None => {
                        // Stream ended without a close frame.
                        break self.on_close(CloseReason::with_reason(
                            CloseCode::Abnormal,
                            "connection lost",
                        ));
                    }
                },
            }
        };

        // The stale connection's halves are dropped before any reconnect
        // wait: the old socket is closed at the transport level and
        // cannot deliver events attributed to the next generation.
        *self.command_tx.lock() = None;
        drop(sink);
        drop(stream);

        end
    }

    /// Normalize a peer close into surfaced events plus the retry
    /// decision. For abnormal closures the reconnect is scheduled first;
    /// the close event is still surfaced afterwards.
    fn on_close(&self, reason: CloseReason) -> SessionEnd {
        match normalize::close_disposition(reason.code) {
            CloseDisposition::Final => {
                tracing::info!(
                    target: "tetherline_ws::client",
                    code = reason.code.as_u16(),
                    "connection closed"
                );
                self.events.closed.emit(reason);
                SessionEnd::Final
            }
            CloseDisposition::Retry => {
                tracing::warn!(
                    target: "tetherline_ws::client",
                    code = reason.code.as_u16(),
                    interval_ms = self.reconnect_interval.as_millis() as u64,
                    "abnormal closure, reconnect scheduled"
                );
                self.set_state(SocketState::Reconnecting);
                self.events.closed.emit(reason);
                SessionEnd::Retry
            }
        }
    }

    fn set_state(&self, next: SocketState) {
        let changed = {
            let mut state = self.state.lock();
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        };
        if changed {
            tracing::debug!(
                target: "tetherline_ws::client",
                state = ?next,
                "state transition"
            );
            self.events.state_changed.emit(next);
        }
    }
}
