//! Inbound dispatcher — routes decoded gateway messages to the store.
//!
//! The dispatcher performs no merging itself. It is the single consumer of
//! the session event queue, so messages are reconciled one at a time, in
//! arrival order.

use std::sync::Arc;

use tokio::sync::mpsc;

use roomlink_domain::event::SyncEvent;
use roomlink_domain::message::InboundMessage;

use crate::session::SessionEvent;
use crate::store::EntityStore;

/// Routes [`InboundMessage`]s and connection events to the [`EntityStore`].
#[derive(Debug, Clone)]
pub struct InboundDispatcher {
    store: Arc<EntityStore>,
}

impl InboundDispatcher {
    #[must_use]
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Apply the reconciliation rule for one message kind.
    pub fn dispatch(&self, message: InboundMessage) {
        match message {
            InboundMessage::SensorUpdate(patch) => {
                self.store.merge_sensor(patch);
            }
            InboundMessage::SensorsList { data } => {
                tracing::debug!(count = data.len(), "applying sensor snapshot");
                self.store.apply_sensor_snapshot(data);
            }
            InboundMessage::EquipmentUpdate(patch) => {
                self.store.merge_equipment(patch);
            }
            InboundMessage::AlertUpdate(patch) => {
                self.store.merge_alert(patch);
            }
            InboundMessage::Command(body) => {
                tracing::debug!(
                    command = ?body.get("command"),
                    "ignoring command notification"
                );
            }
            InboundMessage::Unknown => {
                tracing::debug!("ignoring unrecognized gateway message");
            }
        }
    }

    /// Handle one session event.
    pub fn handle(&self, event: SessionEvent) {
        match event {
            SessionEvent::Message { message, .. } => self.dispatch(message),
            SessionEvent::Opened { channel } => {
                self.store.notify(SyncEvent::ChannelOpened { channel });
            }
            SessionEvent::Closed { channel } => {
                self.store.notify(SyncEvent::ChannelClosed { channel });
            }
            SessionEvent::Degraded { channel } => {
                tracing::warn!(%channel, "gateway channel degraded, showing last known state");
                self.store.notify(SyncEvent::Degraded { channel });
            }
            SessionEvent::Error { channel, error } => {
                tracing::debug!(%channel, %error, "gateway transport error");
            }
        }
    }

    /// Consume session events until the queue closes.
    pub async fn run(self, mut events: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        tracing::debug!("inbound dispatcher stopped");
    }
}
