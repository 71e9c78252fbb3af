//! Transport session — long-lived duplex channels to the gateway.
//!
//! One supervisor task per configured [`Channel`] owns the link for that
//! channel: it connects, pumps frames in both directions, and reconnects
//! after unexpected closes with a linear backoff (`base_delay × attempt`)
//! until `max_attempts` consecutive attempts have been made. Past the cap
//! the channel is *degraded* and stays closed until [`TransportSession::connect`]
//! is called again.
//!
//! Everything the session observes is reported on a single bounded queue of
//! [`SessionEvent`]s, consumed by one task, so handlers run in arrival order
//! and never concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use roomlink_domain::connection::{Channel, ConnectionState};
use roomlink_domain::error::SyncError;
use roomlink_domain::message::{InboundMessage, TelemetryRequest};

use crate::ports::{GatewayConnector, GatewayLink};

/// Tuning knobs for a [`TransportSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay unit of the linear backoff.
    pub base_delay: Duration,
    /// Consecutive reconnect attempts before a channel is degraded.
    pub max_attempts: u32,
    /// Channels to open on `connect`.
    pub channels: Vec<Channel>,
    /// Capacity of the session event queue.
    pub event_capacity: usize,
    /// Frames buffered between `send` and the socket writer.
    pub outbound_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_attempts: 5,
            channels: Channel::ALL.to_vec(),
            event_capacity: 256,
            outbound_capacity: 64,
        }
    }
}

/// Something the session observed on one of its channels.
#[derive(Debug)]
pub enum SessionEvent {
    Opened { channel: Channel },
    /// A decoded inbound frame.
    Message {
        channel: Channel,
        message: InboundMessage,
    },
    /// A non-fatal transport error. The session keeps retrying.
    Error { channel: Channel, error: SyncError },
    Closed { channel: Channel },
    /// Reconnect attempts are exhausted.
    Degraded { channel: Channel },
}

/// Control frame written right after a channel opens.
fn greeting(channel: Channel) -> Option<String> {
    match channel {
        Channel::Telemetry => Some(TelemetryRequest::GetSensors.to_frame()),
        Channel::Equipment => None,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared per-channel state, written by the supervisor and read by the
/// session handle.
#[derive(Debug)]
struct Slot {
    channel: Channel,
    state: Mutex<ConnectionState>,
    writer: Mutex<Option<mpsc::Sender<String>>>,
    attempts: AtomicU32,
    degraded: AtomicBool,
    /// Set while a supervisor owns the slot. Cleared once it has released
    /// the link and before it reports `Degraded`.
    active: AtomicBool,
}

impl Slot {
    fn new(channel: Channel) -> Self {
        Self {
            channel,
            state: Mutex::new(ConnectionState::Closed),
            writer: Mutex::new(None),
            attempts: AtomicU32::new(0),
            degraded: AtomicBool::new(false),
            active: AtomicBool::new(false),
        }
    }

    fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    fn set_state(&self, state: ConnectionState) {
        *lock(&self.state) = state;
    }
}

/// An explicitly owned set of gateway connections.
///
/// Lifecycle: [`new`](Self::new) → [`connect`](Self::connect) →
/// [`disconnect`](Self::disconnect) → drop.
pub struct TransportSession<C> {
    connector: Arc<C>,
    config: SessionConfig,
    events: mpsc::Sender<SessionEvent>,
    slots: Vec<Arc<Slot>>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<HashMap<Channel, JoinHandle<()>>>,
}

impl<C: GatewayConnector> TransportSession<C> {
    /// Create a disconnected session and the receiving end of its event
    /// queue.
    #[must_use]
    pub fn new(connector: C, config: SessionConfig) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (events, rx) = mpsc::channel(config.event_capacity.max(1));
        let (shutdown, _) = watch::channel(false);
        let mut slots: Vec<Arc<Slot>> = Vec::with_capacity(config.channels.len());
        for channel in &config.channels {
            if slots.iter().all(|slot| slot.channel != *channel) {
                slots.push(Arc::new(Slot::new(*channel)));
            }
        }
        let session = Self {
            connector: Arc::new(connector),
            config,
            events,
            slots,
            shutdown,
            tasks: Mutex::new(HashMap::new()),
        };
        (session, rx)
    }

    fn slot(&self, channel: Channel) -> Option<&Arc<Slot>> {
        self.slots.iter().find(|slot| slot.channel == channel)
    }

    /// Open every configured channel.
    ///
    /// Channels that are already connected or reconnecting are left alone.
    /// A degraded channel starts over with a fresh attempt counter.
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) {
        self.shutdown.send_replace(false);
        let mut tasks = lock(&self.tasks);
        for slot in &self.slots {
            let channel = slot.channel;
            let running = tasks.get(&channel).is_some_and(|task| !task.is_finished());
            if running && slot.active.load(Ordering::SeqCst) {
                tracing::debug!(%channel, "gateway channel already active");
                continue;
            }
            slot.active.store(true, Ordering::SeqCst);
            slot.attempts.store(0, Ordering::SeqCst);
            slot.degraded.store(false, Ordering::SeqCst);
            let supervisor = Supervisor {
                connector: Arc::clone(&self.connector),
                slot: Arc::clone(slot),
                events: self.events.clone(),
                shutdown: self.shutdown.subscribe(),
                base_delay: self.config.base_delay,
                max_attempts: self.config.max_attempts,
                outbound_capacity: self.config.outbound_capacity.max(1),
            };
            tracing::info!(%channel, "connecting gateway channel");
            tasks.insert(channel, tokio::spawn(supervisor.run()));
        }
    }

    /// Best-effort write of one text frame.
    ///
    /// Returns `false` and logs a warning when the channel is not open or
    /// its writer cannot take the frame. Never blocks, never queues past
    /// the writer buffer.
    pub fn send(&self, channel: Channel, frame: String) -> bool {
        let Some(slot) = self.slot(channel) else {
            tracing::warn!(%channel, "gateway channel not configured, dropping frame");
            return false;
        };
        let state = slot.state();
        if !state.is_open() {
            tracing::warn!(%channel, %state, "gateway channel not open, dropping frame");
            return false;
        }
        let writer = lock(&slot.writer).clone();
        let Some(writer) = writer else {
            tracing::warn!(%channel, "gateway writer gone, dropping frame");
            return false;
        };
        match writer.try_send(frame) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%channel, %err, "gateway writer unavailable, dropping frame");
                false
            }
        }
    }

    /// Serialize `value` as JSON and [`send`](Self::send) it.
    pub fn send_json<T: Serialize>(&self, channel: Channel, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(frame) => self.send(channel, frame),
            Err(err) => {
                tracing::warn!(%channel, %err, "failed to encode outbound frame");
                false
            }
        }
    }

    /// Close every channel and cancel pending reconnects. Waits for the
    /// supervisors to finish. Idempotent.
    pub async fn disconnect(&self) {
        self.shutdown.send_replace(true);
        let handles: Vec<_> = {
            let mut tasks = lock(&self.tasks);
            tasks.drain().collect()
        };
        for (channel, handle) in handles {
            if let Err(err) = handle.await
                && err.is_panic()
            {
                tracing::error!(%channel, %err, "gateway supervisor panicked");
            }
        }
        for slot in &self.slots {
            slot.set_state(ConnectionState::Closed);
            *lock(&slot.writer) = None;
        }
        tracing::info!("gateway session disconnected");
    }

    /// Current state of `channel`. Unconfigured channels read as closed.
    #[must_use]
    pub fn state(&self, channel: Channel) -> ConnectionState {
        self.slot(channel)
            .map_or(ConnectionState::Closed, |slot| slot.state())
    }

    /// Reconnect attempts made since the last successful open.
    #[must_use]
    pub fn attempts(&self, channel: Channel) -> u32 {
        self.slot(channel)
            .map_or(0, |slot| slot.attempts.load(Ordering::SeqCst))
    }

    #[must_use]
    pub fn is_degraded(&self, channel: Channel) -> bool {
        self.slot(channel)
            .is_some_and(|slot| slot.degraded.load(Ordering::SeqCst))
    }
}

impl<C> Drop for TransportSession<C> {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

enum LinkEnd {
    Shutdown,
    Lost,
}

async fn wait_shutdown(shutdown: &mut watch::Receiver<bool>) {
    // a dropped session counts as shutdown
    let _ = shutdown.wait_for(|stop| *stop).await;
}

struct Supervisor<C> {
    connector: Arc<C>,
    slot: Arc<Slot>,
    events: mpsc::Sender<SessionEvent>,
    shutdown: watch::Receiver<bool>,
    base_delay: Duration,
    max_attempts: u32,
    outbound_capacity: usize,
}

impl<C: GatewayConnector> Supervisor<C> {
    fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn emit(&mut self, event: SessionEvent) {
        if self.is_shutdown() {
            let _ = self.events.try_send(event);
            return;
        }
        tokio::select! {
            result = self.events.send(event) => {
                if result.is_err() {
                    tracing::debug!(channel = %self.slot.channel, "session event receiver dropped");
                }
            }
            () = wait_shutdown(&mut self.shutdown) => {}
        }
    }

    async fn run(mut self) {
        let channel = self.slot.channel;
        let mut degraded = false;
        loop {
            if self.is_shutdown() {
                break;
            }
            self.slot.set_state(ConnectionState::Connecting);
            let connected = tokio::select! {
                result = self.connector.connect(channel) => Some(result),
                () = wait_shutdown(&mut self.shutdown) => None,
            };
            let Some(result) = connected else { break };

            match result {
                Ok(link) => {
                    self.slot.attempts.store(0, Ordering::SeqCst);
                    tracing::info!(%channel, "gateway channel open");
                    if matches!(self.pump(link).await, LinkEnd::Shutdown) {
                        break;
                    }
                    tracing::warn!(%channel, "gateway channel closed unexpectedly");
                }
                Err(error) => {
                    self.slot.set_state(ConnectionState::Closed);
                    tracing::warn!(%channel, %error, "gateway connection failed");
                    self.emit(SessionEvent::Error { channel, error }).await;
                }
            }

            let made = self.slot.attempts.load(Ordering::SeqCst);
            if made >= self.max_attempts {
                self.slot.degraded.store(true, Ordering::SeqCst);
                tracing::warn!(
                    %channel,
                    attempts = made,
                    "reconnect attempts exhausted, channel degraded"
                );
                degraded = true;
                break;
            }
            let attempt = made + 1;
            self.slot.attempts.store(attempt, Ordering::SeqCst);
            let delay = self.base_delay * attempt;
            tracing::info!(
                %channel,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "scheduling gateway reconnect"
            );
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = wait_shutdown(&mut self.shutdown) => break,
            }
        }
        self.slot.set_state(ConnectionState::Closed);
        *lock(&self.slot.writer) = None;
        self.slot.active.store(false, Ordering::SeqCst);
        if degraded {
            self.emit(SessionEvent::Degraded { channel }).await;
        }
    }

    /// Move frames over an open link until it closes or the session shuts
    /// down.
    async fn pump(&mut self, mut link: C::Link) -> LinkEnd {
        let channel = self.slot.channel;
        let (writer, mut outbound) = mpsc::channel::<String>(self.outbound_capacity);
        *lock(&self.slot.writer) = Some(writer);
        self.slot.set_state(ConnectionState::Open);
        self.emit(SessionEvent::Opened { channel }).await;

        if let Some(frame) = greeting(channel)
            && let Err(error) = link.send(frame).await
        {
            tracing::warn!(%channel, %error, "failed to send channel greeting");
        }

        let end = loop {
            tokio::select! {
                frame = link.recv() => match frame {
                    Some(Ok(raw)) => self.deliver(&raw).await,
                    Some(Err(error)) => {
                        tracing::warn!(%channel, %error, "gateway read failed");
                        self.emit(SessionEvent::Error { channel, error }).await;
                        break LinkEnd::Lost;
                    }
                    None => break LinkEnd::Lost,
                },
                frame = outbound.recv() => {
                    let Some(frame) = frame else { break LinkEnd::Lost };
                    if let Err(error) = link.send(frame).await {
                        tracing::warn!(%channel, %error, "gateway write failed");
                        self.emit(SessionEvent::Error { channel, error }).await;
                        break LinkEnd::Lost;
                    }
                }
                () = wait_shutdown(&mut self.shutdown) => break LinkEnd::Shutdown,
            }
        };

        *lock(&self.slot.writer) = None;
        self.slot.set_state(ConnectionState::Closing);
        link.close().await;
        self.slot.set_state(ConnectionState::Closed);
        self.emit(SessionEvent::Closed { channel }).await;
        end
    }

    async fn deliver(&mut self, raw: &str) {
        let channel = self.slot.channel;
        match InboundMessage::parse(raw) {
            Ok(message) => {
                tracing::trace!(%channel, kind = message.kind(), "gateway message");
                self.emit(SessionEvent::Message { channel, message }).await;
            }
            Err(error) => {
                tracing::warn!(%channel, %error, len = raw.len(), "dropping malformed gateway frame");
            }
        }
    }
}
