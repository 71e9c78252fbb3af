//! Backend port — request/response calls against the REST backend.
//!
//! Used for the initial population of collections the gateway never pushes
//! in full (equipment, rooms, users, alerts) and for mutations that are not
//! gateway commands.

use std::future::Future;

use roomlink_domain::alert::Alert;
use roomlink_domain::equipment::Equipment;
use roomlink_domain::error::SyncError;
use roomlink_domain::id::{AlertId, EquipmentId, RoomId, SensorId, UserId};
use roomlink_domain::room::Room;
use roomlink_domain::sensor::{NewSensor, Sensor, SensorPatch};
use roomlink_domain::user::{NewUser, User};

/// The REST backend collaborator.
pub trait BackendApi: Send + Sync + 'static {
    fn fetch_sensors(&self) -> impl Future<Output = Result<Vec<Sensor>, SyncError>> + Send;

    fn fetch_equipment(&self) -> impl Future<Output = Result<Vec<Equipment>, SyncError>> + Send;

    fn fetch_rooms(&self) -> impl Future<Output = Result<Vec<Room>, SyncError>> + Send;

    fn fetch_users(&self) -> impl Future<Output = Result<Vec<User>, SyncError>> + Send;

    fn fetch_alerts(&self) -> impl Future<Output = Result<Vec<Alert>, SyncError>> + Send;

    /// Create a sensor. The backend assigns the id.
    fn create_sensor(&self, sensor: &NewSensor)
    -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Change the fields set in `patch` on the sensor it names.
    fn update_sensor(&self, patch: &SensorPatch)
    -> impl Future<Output = Result<(), SyncError>> + Send;

    fn delete_sensor(&self, id: &SensorId) -> impl Future<Output = Result<(), SyncError>> + Send;

    fn delete_equipment(&self, id: EquipmentId)
    -> impl Future<Output = Result<(), SyncError>> + Send;

    fn delete_room(&self, id: &RoomId) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Create a user account. The backend assigns the id.
    fn create_user(&self, user: &NewUser) -> impl Future<Output = Result<(), SyncError>> + Send;

    fn update_user(
        &self,
        id: &UserId,
        user: &NewUser,
    ) -> impl Future<Output = Result<(), SyncError>> + Send;

    fn delete_user(&self, id: &UserId) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Mark an alert acknowledged on the backend.
    fn acknowledge_alert(&self, id: &AlertId) -> impl Future<Output = Result<(), SyncError>> + Send;
}
