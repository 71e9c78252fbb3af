//! In-memory fakes of the ports, shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::time::Instant;

use roomlink_domain::alert::Alert;
use roomlink_domain::connection::Channel;
use roomlink_domain::equipment::Equipment;
use roomlink_domain::error::SyncError;
use roomlink_domain::id::{AlertId, EquipmentId, RoomId, SensorId, UserId};
use roomlink_domain::room::Room;
use roomlink_domain::sensor::{NewSensor, Sensor, SensorPatch};
use roomlink_domain::user::{NewUser, User};

use crate::ports::{BackendApi, GatewayConnector, GatewayLink};

// -- gateway -----------------------------------------------------------------

#[derive(Default)]
struct ConnectorState {
    /// `None` entries refuse the connection.
    scripts: HashMap<Channel, VecDeque<Option<FakeLink>>>,
    connects: HashMap<Channel, Vec<Instant>>,
}

/// Connector replaying a per-channel script. An empty script refuses.
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl FakeConnector {
    fn lock(&self) -> MutexGuard<'_, ConnectorState> {
        self.state.lock().unwrap()
    }

    /// Refuse the next connect on `channel`.
    pub(crate) fn refuse(&self, channel: Channel) {
        self.lock()
            .scripts
            .entry(channel)
            .or_default()
            .push_back(None);
    }

    /// Accept the next connect on `channel`; the returned handle plays the
    /// gateway side of the link.
    pub(crate) fn accept(&self, channel: Channel) -> FakeRemote {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (sent, from_client) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let link = FakeLink {
            inbound,
            sent,
            closed: Arc::clone(&closed),
        };
        self.lock()
            .scripts
            .entry(channel)
            .or_default()
            .push_back(Some(link));
        FakeRemote {
            to_client,
            from_client,
            closed,
        }
    }

    pub(crate) fn connect_count(&self, channel: Channel) -> usize {
        self.lock().connects.get(&channel).map_or(0, Vec::len)
    }

    pub(crate) fn connect_times(&self, channel: Channel) -> Vec<Instant> {
        self.lock()
            .connects
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }
}

impl GatewayConnector for FakeConnector {
    type Link = FakeLink;

    fn connect(
        &self,
        channel: Channel,
    ) -> impl Future<Output = Result<Self::Link, SyncError>> + Send {
        let next = {
            let mut state = self.lock();
            state
                .connects
                .entry(channel)
                .or_default()
                .push(Instant::now());
            state
                .scripts
                .get_mut(&channel)
                .and_then(VecDeque::pop_front)
                .flatten()
        };
        async move { next.ok_or_else(|| SyncError::Transport("connection refused".into())) }
    }
}

pub(crate) struct FakeLink {
    inbound: mpsc::UnboundedReceiver<String>,
    sent: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl GatewayLink for FakeLink {
    fn send(&mut self, frame: String) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self
            .sent
            .send(frame)
            .map_err(|_| SyncError::Transport("remote gone".into()));
        async move { result }
    }

    fn recv(&mut self) -> impl Future<Output = Option<Result<String, SyncError>>> + Send {
        async move { self.inbound.recv().await.map(Ok) }
    }

    fn close(&mut self) -> impl Future<Output = ()> + Send {
        self.closed.store(true, Ordering::SeqCst);
        async {}
    }
}

/// Gateway side of a [`FakeLink`]. Dropping it closes the link.
pub(crate) struct FakeRemote {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl FakeRemote {
    /// Push a frame to the client.
    pub(crate) fn push(&self, frame: &str) {
        self.to_client.send(frame.to_string()).unwrap();
    }

    /// Next frame the client wrote.
    pub(crate) async fn next_sent(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    pub(crate) fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// -- backend -----------------------------------------------------------------

#[derive(Default)]
pub(crate) struct BackendState {
    pub(crate) sensors: Vec<Sensor>,
    pub(crate) equipment: Vec<Equipment>,
    pub(crate) rooms: Vec<Room>,
    pub(crate) users: Vec<User>,
    pub(crate) alerts: Vec<Alert>,
    pub(crate) failing: bool,
    pub(crate) calls: Vec<String>,
}

/// Backend answering from in-memory collections.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub(crate) fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn with_sensors(self, sensors: Vec<Sensor>) -> Self {
        self.lock().sensors = sensors;
        self
    }

    pub(crate) fn with_equipment(self, equipment: Vec<Equipment>) -> Self {
        self.lock().equipment = equipment;
        self
    }

    pub(crate) fn with_rooms(self, rooms: Vec<Room>) -> Self {
        self.lock().rooms = rooms;
        self
    }

    pub(crate) fn with_users(self, users: Vec<User>) -> Self {
        self.lock().users = users;
        self
    }

    pub(crate) fn with_alerts(self, alerts: Vec<Alert>) -> Self {
        self.lock().alerts = alerts;
        self
    }

    /// Make every subsequent request fail.
    pub(crate) fn fail_requests(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn call<T>(
        &self,
        name: impl Into<String>,
        handler: impl FnOnce(&mut BackendState) -> Result<T, SyncError>,
    ) -> Result<T, SyncError> {
        let mut state = self.lock();
        state.calls.push(name.into());
        if state.failing {
            return Err(SyncError::Backend("HTTP 500 Internal Server Error".into()));
        }
        handler(&mut state)
    }
}

impl BackendApi for FakeBackend {
    fn fetch_sensors(&self) -> impl Future<Output = Result<Vec<Sensor>, SyncError>> + Send {
        let result = self.call("GET /sensor", |s| Ok(s.sensors.clone()));
        async move { result }
    }

    fn fetch_equipment(&self) -> impl Future<Output = Result<Vec<Equipment>, SyncError>> + Send {
        let result = self.call("GET /equipment", |s| Ok(s.equipment.clone()));
        async move { result }
    }

    fn fetch_rooms(&self) -> impl Future<Output = Result<Vec<Room>, SyncError>> + Send {
        let result = self.call("GET /room", |s| Ok(s.rooms.clone()));
        async move { result }
    }

    fn fetch_users(&self) -> impl Future<Output = Result<Vec<User>, SyncError>> + Send {
        let result = self.call("GET /users", |s| Ok(s.users.clone()));
        async move { result }
    }

    fn fetch_alerts(&self) -> impl Future<Output = Result<Vec<Alert>, SyncError>> + Send {
        let result = self.call("GET /alert", |s| Ok(s.alerts.clone()));
        async move { result }
    }

    fn create_sensor(
        &self,
        sensor: &NewSensor,
    ) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self.call("POST /sensors", |s| {
            let created = Sensor::builder()
                .id(format!("s{}", s.sensors.len() + 1))
                .name(sensor.name.clone())
                .kind(sensor.kind)
                .location(sensor.room.clone(), sensor.floor.clone())
                .reading(sensor.value, sensor.unit.clone())
                .thresholds(sensor.min_threshold, sensor.max_threshold)
                .build()?;
            s.sensors.push(created);
            Ok(())
        });
        async move { result }
    }

    fn update_sensor(
        &self,
        patch: &SensorPatch,
    ) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self.call(format!("PUT /sensor/{}", patch.id), |s| {
            let sensor = s
                .sensors
                .iter_mut()
                .find(|sensor| sensor.id == patch.id)
                .ok_or_else(|| {
                    SyncError::Backend(format!("HTTP 404 sensor {} not found", patch.id).into())
                })?;
            sensor.apply(patch.clone());
            Ok(())
        });
        async move { result }
    }

    fn delete_sensor(&self, id: &SensorId) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self.call(format!("DELETE /sensors/{id}"), |s| {
            s.sensors.retain(|sensor| &sensor.id != id);
            Ok(())
        });
        async move { result }
    }

    fn delete_equipment(
        &self,
        id: EquipmentId,
    ) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self.call(format!("DELETE /equipment/{id}"), |s| {
            s.equipment.retain(|item| item.id != id);
            Ok(())
        });
        async move { result }
    }

    fn delete_room(&self, id: &RoomId) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self.call(format!("DELETE /rooms/{id}"), |s| {
            s.rooms.retain(|room| &room.id != id);
            Ok(())
        });
        async move { result }
    }

    fn create_user(&self, user: &NewUser) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self.call("POST /users", |s| {
            s.users.push(User {
                id: UserId::new((s.users.len() + 1).to_string()),
                firstname: user.firstname.clone(),
                lastname: user.lastname.clone(),
                role: user.role,
                email: user.email.clone(),
                created_at: None,
            });
            Ok(())
        });
        async move { result }
    }

    fn update_user(
        &self,
        id: &UserId,
        user: &NewUser,
    ) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self.call(format!("PUT /users/{id}"), |s| {
            let existing = s.users.iter_mut().find(|u| &u.id == id).ok_or_else(|| {
                SyncError::Backend(format!("HTTP 404 user {id} not found").into())
            })?;
            existing.firstname.clone_from(&user.firstname);
            existing.lastname.clone_from(&user.lastname);
            existing.email.clone_from(&user.email);
            existing.role = user.role;
            Ok(())
        });
        async move { result }
    }

    fn delete_user(&self, id: &UserId) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self.call(format!("DELETE /users/{id}"), |s| {
            s.users.retain(|u| &u.id != id);
            Ok(())
        });
        async move { result }
    }

    fn acknowledge_alert(&self, id: &AlertId) -> impl Future<Output = Result<(), SyncError>> + Send {
        let result = self.call(format!("POST /alert/{id}/acknowledge"), |s| {
            if let Some(alert) = s.alerts.iter_mut().find(|a| &a.id == id) {
                alert.acknowledge();
            }
            Ok(())
        });
        async move { result }
    }
}
