//! Synchronization facade — the only entry point for UI code.
//!
//! The facade owns the transport session, the backend client and the
//! entity store. Every public operation ends in a logged path: failures
//! come back as `false`, never as a panic or an error the caller has to
//! handle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use roomlink_domain::command::{ActorMeta, CommandIntent, CommandVerb};
use roomlink_domain::connection::{Channel, ConnectionState};
use roomlink_domain::equipment::EquipmentChanges;
use roomlink_domain::event::SyncEvent;
use roomlink_domain::id::{AlertId, EquipmentId, RoomId, SensorId, UserId};
use roomlink_domain::message::TelemetryRequest;
use roomlink_domain::sensor::{NewSensor, SensorPatch};
use roomlink_domain::user::NewUser;

use crate::dispatcher::InboundDispatcher;
use crate::encoder::CommandEncoder;
use crate::event_bus::InProcessEventBus;
use crate::ports::{BackendApi, GatewayConnector};
use crate::session::{SessionEvent, TransportSession};
use crate::store::EntityStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single entry point for the presentation layer.
pub struct SyncFacade<C, B> {
    session: TransportSession<C>,
    backend: B,
    encoder: CommandEncoder,
    store: Arc<EntityStore>,
    session_events: Mutex<Option<mpsc::Receiver<SessionEvent>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl<C: GatewayConnector, B: BackendApi> SyncFacade<C, B> {
    /// Assemble a facade from an unconnected session and its event queue.
    #[must_use]
    pub fn new(
        session: TransportSession<C>,
        session_events: mpsc::Receiver<SessionEvent>,
        backend: B,
        encoder: CommandEncoder,
        bus: InProcessEventBus,
    ) -> Self {
        Self {
            session,
            backend,
            encoder,
            store: Arc::new(EntityStore::new(bus)),
            session_events: Mutex::new(Some(session_events)),
            dispatcher: Mutex::new(None),
        }
    }

    /// Read-only access to the synchronized state.
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Receive every change published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.store.bus().subscribe()
    }

    /// Changes as a stream. Slow consumers skip what they missed.
    pub fn changes(&self) -> impl Stream<Item = SyncEvent> + Send + 'static {
        self.store.bus().stream()
    }

    #[must_use]
    pub fn connection_state(&self, channel: Channel) -> ConnectionState {
        self.session.state(channel)
    }

    #[must_use]
    pub fn is_degraded(&self, channel: Channel) -> bool {
        self.session.is_degraded(channel)
    }

    /// Start the dispatcher, open the gateway channels and run the initial
    /// population.
    ///
    /// Gateway messages may be reconciled before the REST fetches return.
    /// Calling `start` again reconnects degraded channels and reloads the
    /// collections. Does nothing after [`teardown`](Self::teardown).
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) {
        if self.store.is_closed() {
            tracing::warn!("sync facade already torn down, not starting");
            return;
        }
        self.spawn_dispatcher();
        self.session.connect();
        self.populate().await;
    }

    fn spawn_dispatcher(&self) {
        let Some(events) = lock(&self.session_events).take() else {
            return;
        };
        let dispatcher = InboundDispatcher::new(Arc::clone(&self.store));
        *lock(&self.dispatcher) = Some(tokio::spawn(dispatcher.run(events)));
    }

    async fn populate(&self) {
        let (equipment, rooms, users) = tokio::join!(
            self.backend.fetch_equipment(),
            self.backend.fetch_rooms(),
            self.backend.fetch_users(),
        );
        match equipment {
            Ok(equipment) => {
                self.store.replace_equipment(equipment);
            }
            Err(err) => tracing::error!(%err, "failed to load equipment"),
        }
        match rooms {
            Ok(rooms) => {
                self.store.replace_rooms(rooms);
            }
            Err(err) => tracing::error!(%err, "failed to load rooms"),
        }
        match users {
            Ok(users) => {
                self.store.replace_users(users);
            }
            Err(err) => tracing::error!(%err, "failed to load users"),
        }
        self.refresh_alerts().await;

        // the session greets the telemetry channel on open
        if self.store.has_sensors() {
            return;
        }
        match self.backend.fetch_sensors().await {
            Ok(sensors) => {
                if !self.store.seed_sensors(sensors) {
                    tracing::debug!("telemetry snapshot arrived first, REST sensors discarded");
                }
            }
            Err(err) => tracing::error!(%err, "failed to load sensors"),
        }
    }

    /// Ask the gateway to push its full sensor snapshot. Best effort.
    pub fn request_sensor_snapshot(&self) -> bool {
        self.session
            .send(Channel::Telemetry, TelemetryRequest::GetSensors.to_frame())
    }

    /// Apply an equipment change locally, then send the command.
    ///
    /// Returns once both have been issued; the gateway confirms (or
    /// overrides) later through an `equipment_update`. Returns whether the
    /// command was handed to the transport.
    #[tracing::instrument(skip(self))]
    pub fn mutate_equipment(
        &self,
        id: EquipmentId,
        verb: CommandVerb,
        changes: EquipmentChanges,
    ) -> bool {
        if !self.store.apply_optimistic_equipment(id, &changes) {
            tracing::debug!(%id, "equipment not loaded, no optimistic update");
        }
        let intent = CommandIntent::equipment(id, verb, changes)
            .with_meta(ActorMeta::user(self.encoder.default_actor()));
        let envelope = self.encoder.encode(&intent);
        self.session.send_json(Channel::Equipment, &envelope)
    }

    /// Flip the power status of a loaded equipment item.
    #[tracing::instrument(skip(self))]
    pub fn toggle_equipment(&self, id: EquipmentId) -> bool {
        let Some(item) = self.store.equipment_item(id) else {
            tracing::warn!(%id, "cannot toggle unknown equipment");
            return false;
        };
        if !item.controllable {
            tracing::warn!(%id, "equipment is not controllable");
            return false;
        }
        self.mutate_equipment(
            id,
            CommandVerb::Toggle,
            EquipmentChanges::status(item.status.toggled()),
        )
    }

    /// Change the set-point of an equipment item.
    #[tracing::instrument(skip(self))]
    pub fn set_equipment_value(&self, id: EquipmentId, value: f64) -> bool {
        self.mutate_equipment(id, CommandVerb::Update, EquipmentChanges::value(value))
    }

    /// Acknowledge an alert on the backend, then locally.
    ///
    /// The local flag only flips once the backend accepted the request.
    #[tracing::instrument(skip(self))]
    pub async fn acknowledge_alert(&self, id: &AlertId) -> bool {
        match self.backend.acknowledge_alert(id).await {
            Ok(()) => {
                if !self.store.acknowledge_alert(id) {
                    tracing::debug!(%id, "acknowledged alert not held locally");
                }
                true
            }
            Err(err) => {
                tracing::error!(%id, %err, "failed to acknowledge alert");
                false
            }
        }
    }

    /// Reload alerts from the backend.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_alerts(&self) -> bool {
        match self.backend.fetch_alerts().await {
            Ok(alerts) => self.store.replace_alerts(alerts),
            Err(err) => {
                tracing::error!(%err, "failed to load alerts");
                false
            }
        }
    }

    /// Reload sensors from the backend, replacing the local collection.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_sensors(&self) -> bool {
        match self.backend.fetch_sensors().await {
            Ok(sensors) => self.store.replace_sensors(sensors),
            Err(err) => {
                tracing::error!(%err, "failed to load sensors");
                false
            }
        }
    }

    async fn refresh_users(&self) -> bool {
        match self.backend.fetch_users().await {
            Ok(users) => self.store.replace_users(users),
            Err(err) => {
                tracing::error!(%err, "failed to load users");
                false
            }
        }
    }

    /// Register a new sensor, then reload the sensor list.
    #[tracing::instrument(skip(self, sensor), fields(sensor_name = %sensor.name))]
    pub async fn add_sensor(&self, sensor: NewSensor) -> bool {
        if let Err(err) = sensor.validate() {
            tracing::warn!(%err, "rejecting invalid sensor");
            return false;
        }
        if let Err(err) = self.backend.create_sensor(&sensor).await {
            tracing::error!(%err, "failed to create sensor");
            return false;
        }
        self.refresh_sensors().await
    }

    /// Edit a sensor's settings on the backend, then merge the same fields
    /// locally. Telemetry keeps overwriting the reading afterwards.
    #[tracing::instrument(skip(self, patch), fields(id = %patch.id))]
    pub async fn update_sensor(&self, patch: SensorPatch) -> bool {
        if let Err(err) = self.backend.update_sensor(&patch).await {
            tracing::error!(%err, "failed to update sensor");
            return false;
        }
        if !self.store.merge_sensor(patch) {
            tracing::debug!("updated sensor not held locally");
        }
        true
    }

    /// Delete a sensor; removed locally once the backend confirms.
    #[tracing::instrument(skip(self))]
    pub async fn delete_sensor(&self, id: &SensorId) -> bool {
        match self.backend.delete_sensor(id).await {
            Ok(()) => {
                self.store.remove_sensor(id);
                true
            }
            Err(err) => {
                tracing::error!(%id, %err, "failed to delete sensor");
                false
            }
        }
    }

    /// Delete an equipment item; removed locally once the backend confirms.
    #[tracing::instrument(skip(self))]
    pub async fn delete_equipment(&self, id: EquipmentId) -> bool {
        match self.backend.delete_equipment(id).await {
            Ok(()) => {
                self.store.remove_equipment(id);
                true
            }
            Err(err) => {
                tracing::error!(%id, %err, "failed to delete equipment");
                false
            }
        }
    }

    /// Delete a room; removed locally once the backend confirms.
    #[tracing::instrument(skip(self))]
    pub async fn delete_room(&self, id: &RoomId) -> bool {
        match self.backend.delete_room(id).await {
            Ok(()) => {
                self.store.remove_room(id);
                true
            }
            Err(err) => {
                tracing::error!(%id, %err, "failed to delete room");
                false
            }
        }
    }

    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create_user(&self, user: NewUser) -> bool {
        if let Err(err) = user.validate() {
            tracing::warn!(%err, "rejecting invalid user");
            return false;
        }
        if let Err(err) = self.backend.create_user(&user).await {
            tracing::error!(%err, "failed to create user");
            return false;
        }
        self.refresh_users().await
    }

    #[tracing::instrument(skip(self, user))]
    pub async fn update_user(&self, id: &UserId, user: NewUser) -> bool {
        if let Err(err) = user.validate() {
            tracing::warn!(%err, "rejecting invalid user");
            return false;
        }
        if let Err(err) = self.backend.update_user(id, &user).await {
            tracing::error!(%id, %err, "failed to update user");
            return false;
        }
        self.refresh_users().await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: &UserId) -> bool {
        if let Err(err) = self.backend.delete_user(id).await {
            tracing::error!(%id, %err, "failed to delete user");
            return false;
        }
        self.refresh_users().await
    }

    /// Disconnect from the gateway, stop reconciling and close the store.
    /// Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn teardown(&self) {
        self.session.disconnect().await;
        let dispatcher = lock(&self.dispatcher).take();
        if let Some(handle) = dispatcher {
            handle.abort();
            let _ = handle.await;
        }
        self.store.close();
    }
}
