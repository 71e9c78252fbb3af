//! Entity store — the single owner of client-side state.
//!
//! Every change to a collection, whether it comes from a gateway message,
//! a REST response or a local optimistic edit, goes through one of the
//! mutators below. Each effective mutation publishes a [`SyncEvent`] after
//! the lock is released.
//!
//! Collections keep the order in which the gateway or backend delivered
//! them.

use std::sync::{Mutex, MutexGuard, PoisonError};

use roomlink_domain::alert::{Alert, AlertPatch};
use roomlink_domain::equipment::{Equipment, EquipmentChanges, EquipmentPatch};
use roomlink_domain::event::SyncEvent;
use roomlink_domain::id::{AlertId, EquipmentId, RoomId, SensorId};
use roomlink_domain::room::Room;
use roomlink_domain::sensor::{Sensor, SensorPatch};
use roomlink_domain::time::now;
use roomlink_domain::user::User;

use crate::event_bus::InProcessEventBus;

#[derive(Debug, Default)]
struct State {
    sensors: Vec<Sensor>,
    equipment: Vec<Equipment>,
    alerts: Vec<Alert>,
    rooms: Vec<Room>,
    users: Vec<User>,
    /// A telemetry `sensors_list` has been applied at least once.
    telemetry_seen: bool,
    closed: bool,
}

/// In-memory store of sensors, equipment, alerts, rooms and users.
#[derive(Debug)]
pub struct EntityStore {
    state: Mutex<State>,
    bus: InProcessEventBus,
}

impl EntityStore {
    /// Create an empty store publishing changes on `bus`.
    #[must_use]
    pub fn new(bus: InProcessEventBus) -> Self {
        Self {
            state: Mutex::new(State::default()),
            bus,
        }
    }

    /// The bus this store publishes on.
    #[must_use]
    pub fn bus(&self) -> &InProcessEventBus {
        &self.bus
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `mutation` under the lock unless the store is closed, then
    /// publish the event it returned.
    fn commit(&self, mutation: impl FnOnce(&mut State) -> Option<SyncEvent>) -> bool {
        let event = {
            let mut state = self.lock();
            if state.closed {
                tracing::debug!("store closed, discarding mutation");
                return false;
            }
            mutation(&mut state)
        };
        match event {
            Some(event) => {
                self.bus.publish(event);
                true
            }
            None => false,
        }
    }

    /// Publish a connection lifecycle event in the same ordered stream as
    /// data changes. Ignored once the store is closed.
    pub fn notify(&self, event: SyncEvent) {
        self.commit(|_| Some(event));
    }

    // -- snapshots ---------------------------------------------------------

    #[must_use]
    pub fn sensors(&self) -> Vec<Sensor> {
        self.lock().sensors.clone()
    }

    #[must_use]
    pub fn sensor(&self, id: &SensorId) -> Option<Sensor> {
        self.lock().sensors.iter().find(|s| &s.id == id).cloned()
    }

    #[must_use]
    pub fn equipment(&self) -> Vec<Equipment> {
        self.lock().equipment.clone()
    }

    #[must_use]
    pub fn equipment_item(&self, id: EquipmentId) -> Option<Equipment> {
        self.lock().equipment.iter().find(|e| e.id == id).cloned()
    }

    #[must_use]
    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().alerts.clone()
    }

    #[must_use]
    pub fn alert(&self, id: &AlertId) -> Option<Alert> {
        self.lock().alerts.iter().find(|a| &a.id == id).cloned()
    }

    /// Alerts not yet acknowledged.
    #[must_use]
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.lock()
            .alerts
            .iter()
            .filter(|a| !a.acknowledged)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn rooms(&self) -> Vec<Room> {
        self.lock().rooms.clone()
    }

    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    #[must_use]
    pub fn has_sensors(&self) -> bool {
        !self.lock().sensors.is_empty()
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    // -- partial merges ----------------------------------------------------

    /// Merge a partial sensor update. Unknown ids are dropped.
    pub fn merge_sensor(&self, patch: SensorPatch) -> bool {
        self.commit(|state| {
            let Some(sensor) = state.sensors.iter_mut().find(|s| s.id == patch.id) else {
                tracing::debug!(id = %patch.id, "dropping update for unknown sensor");
                return None;
            };
            let id = patch.id.clone();
            sensor.apply(patch);
            Some(SyncEvent::SensorChanged { id })
        })
    }

    /// Merge a partial equipment update. Unknown ids are dropped.
    pub fn merge_equipment(&self, patch: EquipmentPatch) -> bool {
        self.commit(|state| {
            let Some(item) = state.equipment.iter_mut().find(|e| e.id == patch.id) else {
                tracing::debug!(id = %patch.id, "dropping update for unknown equipment");
                return None;
            };
            let id = patch.id;
            item.apply(patch);
            Some(SyncEvent::EquipmentChanged { id })
        })
    }

    /// Merge a partial alert update. Unknown ids are dropped; an
    /// acknowledged alert stays acknowledged.
    pub fn merge_alert(&self, patch: AlertPatch) -> bool {
        self.commit(|state| {
            let Some(alert) = state.alerts.iter_mut().find(|a| a.id == patch.id) else {
                tracing::debug!(id = %patch.id, "dropping update for unknown alert");
                return None;
            };
            let id = patch.id.clone();
            alert.apply(patch);
            Some(SyncEvent::AlertChanged { id })
        })
    }

    // -- full-list replacements --------------------------------------------

    /// Replace sensors with the authoritative telemetry snapshot.
    ///
    /// After this, REST seeds are ignored.
    pub fn apply_sensor_snapshot(&self, sensors: Vec<Sensor>) -> bool {
        self.commit(|state| {
            state.telemetry_seen = true;
            let count = sensors.len();
            state.sensors = sensors;
            Some(SyncEvent::SensorsReplaced { count })
        })
    }

    /// Seed sensors from the initial REST fetch.
    ///
    /// Applied only while the collection is empty and no telemetry
    /// snapshot has arrived. Returns `false` when the seed was discarded.
    pub fn seed_sensors(&self, sensors: Vec<Sensor>) -> bool {
        self.commit(|state| {
            if state.telemetry_seen || !state.sensors.is_empty() {
                tracing::debug!("sensors already populated, discarding REST seed");
                return None;
            }
            let count = sensors.len();
            state.sensors = sensors;
            Some(SyncEvent::SensorsReplaced { count })
        })
    }

    /// Replace sensors after an explicit REST reload.
    pub fn replace_sensors(&self, sensors: Vec<Sensor>) -> bool {
        self.commit(|state| {
            let count = sensors.len();
            state.sensors = sensors;
            Some(SyncEvent::SensorsReplaced { count })
        })
    }

    pub fn replace_equipment(&self, equipment: Vec<Equipment>) -> bool {
        self.commit(|state| {
            let count = equipment.len();
            state.equipment = equipment;
            Some(SyncEvent::EquipmentReplaced { count })
        })
    }

    pub fn replace_alerts(&self, alerts: Vec<Alert>) -> bool {
        self.commit(|state| {
            let count = alerts.len();
            state.alerts = alerts;
            Some(SyncEvent::AlertsReplaced { count })
        })
    }

    pub fn replace_rooms(&self, rooms: Vec<Room>) -> bool {
        self.commit(|state| {
            let count = rooms.len();
            state.rooms = rooms;
            Some(SyncEvent::RoomsReplaced { count })
        })
    }

    pub fn replace_users(&self, users: Vec<User>) -> bool {
        self.commit(|state| {
            let count = users.len();
            state.users = users;
            Some(SyncEvent::UsersReplaced { count })
        })
    }

    // -- local mutations ---------------------------------------------------

    /// Apply a local edit before the gateway confirms it, stamping a fresh
    /// `last_update`. A later gateway update overwrites it.
    pub fn apply_optimistic_equipment(&self, id: EquipmentId, changes: &EquipmentChanges) -> bool {
        self.commit(|state| {
            let item = state.equipment.iter_mut().find(|e| e.id == id)?;
            item.apply_local(changes, now());
            Some(SyncEvent::EquipmentChanged { id })
        })
    }

    /// Flag an alert acknowledged. Never clears the flag.
    pub fn acknowledge_alert(&self, id: &AlertId) -> bool {
        self.commit(|state| {
            let alert = state.alerts.iter_mut().find(|a| &a.id == id)?;
            alert.acknowledge();
            Some(SyncEvent::AlertChanged { id: id.clone() })
        })
    }

    pub fn remove_sensor(&self, id: &SensorId) -> bool {
        self.commit(|state| {
            let before = state.sensors.len();
            state.sensors.retain(|s| &s.id != id);
            (state.sensors.len() != before).then(|| SyncEvent::SensorRemoved { id: id.clone() })
        })
    }

    pub fn remove_equipment(&self, id: EquipmentId) -> bool {
        self.commit(|state| {
            let before = state.equipment.len();
            state.equipment.retain(|e| e.id != id);
            (state.equipment.len() != before).then_some(SyncEvent::EquipmentRemoved { id })
        })
    }

    pub fn remove_room(&self, id: &RoomId) -> bool {
        self.commit(|state| {
            let before = state.rooms.len();
            state.rooms.retain(|r| &r.id != id);
            (state.rooms.len() != before).then(|| SyncEvent::RoomRemoved { id: id.clone() })
        })
    }

    /// Stop accepting mutations. Results that arrive afterwards are
    /// discarded. Idempotent.
    pub fn close(&self) {
        self.lock().closed = true;
    }
}
