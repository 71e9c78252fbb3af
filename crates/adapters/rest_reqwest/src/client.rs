use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use roomlink_app::ports::BackendApi;
use roomlink_domain::alert::Alert;
use roomlink_domain::equipment::Equipment;
use roomlink_domain::error::SyncError;
use roomlink_domain::id::{AlertId, EquipmentId, RoomId, SensorId, UserId};
use roomlink_domain::room::Room;
use roomlink_domain::sensor::{NewSensor, Sensor, SensorPatch};
use roomlink_domain::user::{NewUser, User};

use crate::config::RestConfig;
use crate::error::RestError;

/// [`BackendApi`] over the gateway's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Build a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Http`] if the underlying client cannot be built.
    pub fn new(config: &RestConfig) -> Result<Self, RestError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RestError> {
        let response = self.http.get(self.url(path)).send().await?;
        let response = Self::check(path, response).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), RestError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::check(path, response).await.map(drop)
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), RestError> {
        let response = self.http.put(self.url(path)).json(body).send().await?;
        Self::check(path, response).await.map(drop)
    }

    async fn delete(&self, path: &str) -> Result<(), RestError> {
        let response = self.http.delete(self.url(path)).send().await?;
        Self::check(path, response).await.map(drop)
    }

    /// Turn non-success statuses into errors. Mutation bodies are ignored.
    async fn check(
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RestError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RestError::NotFound {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RestError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl BackendApi for HttpBackend {
    #[tracing::instrument(skip(self))]
    async fn fetch_sensors(&self) -> Result<Vec<Sensor>, SyncError> {
        Ok(self.get("/sensor").await?)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_equipment(&self) -> Result<Vec<Equipment>, SyncError> {
        Ok(self.get("/equipment").await?)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_rooms(&self) -> Result<Vec<Room>, SyncError> {
        Ok(self.get("/room").await?)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_users(&self) -> Result<Vec<User>, SyncError> {
        Ok(self.get("/users").await?)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_alerts(&self) -> Result<Vec<Alert>, SyncError> {
        Ok(self.get("/alert").await?)
    }

    #[tracing::instrument(skip(self, sensor), fields(name = %sensor.name))]
    async fn create_sensor(&self, sensor: &NewSensor) -> Result<(), SyncError> {
        Ok(self.post("/sensors", sensor).await?)
    }

    #[tracing::instrument(skip(self, patch), fields(id = %patch.id))]
    async fn update_sensor(&self, patch: &SensorPatch) -> Result<(), SyncError> {
        Ok(self.put(&format!("/sensor/{}", patch.id), patch).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_sensor(&self, id: &SensorId) -> Result<(), SyncError> {
        Ok(self.delete(&format!("/sensors/{id}")).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_equipment(&self, id: EquipmentId) -> Result<(), SyncError> {
        Ok(self.delete(&format!("/equipment/{id}")).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_room(&self, id: &RoomId) -> Result<(), SyncError> {
        Ok(self.delete(&format!("/rooms/{id}")).await?)
    }

    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: &NewUser) -> Result<(), SyncError> {
        Ok(self.post("/users", user).await?)
    }

    #[tracing::instrument(skip(self, user))]
    async fn update_user(&self, id: &UserId, user: &NewUser) -> Result<(), SyncError> {
        Ok(self.put(&format!("/users/{id}"), user).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_user(&self, id: &UserId) -> Result<(), SyncError> {
        Ok(self.delete(&format!("/users/{id}")).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn acknowledge_alert(&self, id: &AlertId) -> Result<(), SyncError> {
        Ok(self
            .post(&format!("/alert/{id}/acknowledge"), &serde_json::Value::Null)
            .await?)
    }
}
