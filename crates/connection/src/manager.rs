//! Connection manager: keeps one WebSocket to the chat server alive.
//!
//! The manager owns at most one transport, an ordered listener registry
//! per event kind, and at most one pending retry timer. While connecting is
//! enabled, every close schedules a reconnect according to the
//! [`RetryPolicy`](crate::RetryPolicy); disabling it cancels the timer and
//! tears the transport down.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ConnectionError;
use crate::listeners::{Listener, ListenerRegistry};
use crate::reconnection::RetryTimer;
use crate::transport::Transport;
use crate::types::{ConnectionConfig, ConnectionEvent, ConnectionState, EventKind, Payload};
use crate::ws_client::{Connector, WsConnector};

/// Mutable lifecycle state, guarded by one lock.
#[derive(Default)]
pub(crate) struct LifecycleState {
    connecting_enabled: bool,
    transport: Option<Transport>,
    pending_retry: Option<RetryTimer>,
    /// Consecutive closes since the last successful open.
    failed_attempts: u32,
    next_generation: u64,
    next_timer_id: u64,
}

/// State shared between the manager handle, the transport task and the
/// retry timer task.
pub(crate) struct Shared {
    pub(crate) url: String,
    pub(crate) config: ConnectionConfig,
    pub(crate) connector: Arc<dyn Connector>,
    state: Mutex<LifecycleState>,
    listeners: Mutex<ListenerRegistry>,
    /// Newest generation that has emitted `Open`. Held while listeners run,
    /// which serialises delivery across transports.
    delivery: Mutex<u64>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_listeners(&self) -> MutexGuard<'_, ListenerRegistry> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Opens a new transport unless one already exists.
    fn connect_locked(self: &Arc<Self>, st: &mut LifecycleState) {
        if st.transport.is_some() {
            return;
        }
        if let Some(timer) = st.pending_retry.take() {
            timer.cancel();
        }
        st.next_generation += 1;
        let generation = st.next_generation;
        info!(url = %self.url, generation, "connecting");
        st.transport = Some(Transport::spawn(self, generation));
    }

    /// Marks the transport open. Returns `false` if `generation` is no
    /// longer the current transport.
    pub(crate) fn handle_open(&self, generation: u64) -> bool {
        let mut st = self.lock_state();
        match st.transport.as_mut() {
            Some(t) if t.generation == generation => {
                t.open = true;
                st.failed_attempts = 0;
                true
            }
            _ => false,
        }
    }

    /// Close handler. Runs before listeners see `Close`.
    pub(crate) fn handle_close(self: &Arc<Self>, generation: u64) {
        let mut st = self.lock_state();
        if !st
            .transport
            .as_ref()
            .is_some_and(|t| t.generation == generation)
        {
            debug!(generation, "ignoring close of a superseded transport");
            return;
        }
        st.transport = None;

        if !st.connecting_enabled {
            return;
        }

        st.failed_attempts = st.failed_attempts.saturating_add(1);
        let attempt = st.failed_attempts;
        match self.config.retry.delay_for_attempt(attempt) {
            Some(delay) => {
                st.next_timer_id += 1;
                let id = st.next_timer_id;
                info!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "scheduling reconnect"
                );
                st.pending_retry = Some(RetryTimer::schedule(self, id, attempt, delay));
            }
            None => {
                warn!(attempt, "retry limit reached, giving up");
                st.connecting_enabled = false;
                st.failed_attempts = 0;
            }
        }
    }

    /// Retry timer callback.
    pub(crate) fn retry_fired(self: &Arc<Self>, id: u64) {
        let mut st = self.lock_state();
        if !st.pending_retry.as_ref().is_some_and(|t| t.id == id) {
            debug!(timer = id, "ignoring stale retry timer");
            return;
        }
        st.pending_retry = None;
        if st.connecting_enabled {
            self.connect_locked(&mut st);
        }
    }

    /// Delivers `event` from transport `generation` to every listener of
    /// its kind, in registration order. Events from a generation older than
    /// the newest opened one are dropped; returns whether it was delivered.
    ///
    /// The registry lock is not held while listeners run, so listeners may
    /// add or remove listeners and call the manager.
    pub(crate) fn dispatch_from(&self, generation: u64, event: &ConnectionEvent) -> bool {
        let mut newest_open = self.delivery.lock().unwrap_or_else(|e| e.into_inner());
        if generation < *newest_open {
            debug!(
                generation,
                newest_open = *newest_open,
                kind = %event.kind(),
                "dropping event from a replaced transport"
            );
            return false;
        }
        if matches!(event, ConnectionEvent::Open) {
            *newest_open = generation;
        }

        let listeners = self.lock_listeners().snapshot(event.kind());
        for listener in listeners {
            listener(event);
        }
        true
    }
}

/// Connection manager for the chat WebSocket.
///
/// All methods are synchronous and never block. Starting a connection
/// spawns Tokio tasks, so [`start_connecting`](Self::start_connecting)
/// must be called from within a Tokio runtime. Dropping the manager stops it.
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    /// Creates an idle manager that connects to `url` with the WebSocket
    /// connector.
    pub fn new(url: impl Into<String>, config: ConnectionConfig) -> Self {
        let connector = Arc::new(WsConnector::new(config.max_message_size));
        Self::with_connector(url, config, connector)
    }

    /// Creates an idle manager with a custom [`Connector`].
    pub fn with_connector(
        url: impl Into<String>,
        config: ConnectionConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                url: url.into(),
                config,
                connector,
                state: Mutex::new(LifecycleState::default()),
                listeners: Mutex::new(ListenerRegistry::default()),
                delivery: Mutex::new(0),
            }),
        }
    }

    /// Enables connecting. Opens a connection right away when idle; does
    /// nothing else if a transport or a retry is already in place.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while idle.
    pub fn start_connecting(&self) {
        let mut st = self.shared.lock_state();
        st.connecting_enabled = true;
        if st.transport.is_none() && st.pending_retry.is_none() {
            st.failed_attempts = 0;
            self.shared.connect_locked(&mut st);
        }
    }

    /// Disables connecting, cancels a pending retry and closes the live
    /// transport. After this returns neither exists.
    pub fn stop_connecting(&self) {
        let (transport, timer) = {
            let mut st = self.shared.lock_state();
            st.connecting_enabled = false;
            st.failed_attempts = 0;
            (st.transport.take(), st.pending_retry.take())
        };
        if let Some(transport) = transport {
            info!(generation = transport.generation, "closing connection");
            transport.close();
        }
        if let Some(timer) = timer {
            debug!(timer = timer.id, "cancelling pending reconnect");
            timer.cancel();
        }
    }

    /// Queues `payload` on the live transport.
    ///
    /// Fails with [`ConnectionError::NoConnection`] when there is no
    /// transport; callers are expected to track `open`/`close` themselves.
    pub fn send(&self, payload: impl Into<Payload>) -> Result<(), ConnectionError> {
        let st = self.shared.lock_state();
        let transport = st.transport.as_ref().ok_or(ConnectionError::NoConnection)?;
        transport.send(payload.into())
    }

    /// Serializes `frame` as JSON and sends it as a text payload.
    pub fn send_json<T: Serialize>(&self, frame: &T) -> Result<(), ConnectionError> {
        let text = serde_json::to_string(frame)?;
        self.send(text)
    }

    /// Registers `listener` for `kind`. Listeners survive reconnects.
    pub fn add_event_listener(&self, kind: EventKind, listener: Listener) {
        self.shared.lock_listeners().add(kind, listener);
    }

    /// Unregisters one entry of `listener` for `kind`. Unknown listeners
    /// are ignored.
    pub fn remove_event_listener(&self, kind: EventKind, listener: &Listener) {
        if !self.shared.lock_listeners().remove(kind, listener) {
            debug!(%kind, "remove_event_listener: listener not registered");
        }
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.shared.lock_listeners().len(kind)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        let st = self.shared.lock_state();
        match (&st.transport, &st.pending_retry) {
            (Some(t), _) if t.open => ConnectionState::Open,
            (Some(_), _) => ConnectionState::Connecting,
            (None, Some(timer)) => ConnectionState::WaitingToRetry {
                attempt: timer.attempt,
            },
            (None, None) => ConnectionState::Idle,
        }
    }

    /// Whether the manager is trying to stay connected.
    pub fn is_connecting_enabled(&self) -> bool {
        self.shared.lock_state().connecting_enabled
    }

    /// Whether a transport exists (connecting or open).
    pub fn has_transport(&self) -> bool {
        self.shared.lock_state().transport.is_some()
    }

    /// Whether a reconnect is scheduled.
    pub fn has_pending_retry(&self) -> bool {
        self.shared.lock_state().pending_retry.is_some()
    }

    /// Endpoint this manager connects to.
    pub fn url(&self) -> &str {
        &self.shared.url
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.stop_connecting();
    }
}
