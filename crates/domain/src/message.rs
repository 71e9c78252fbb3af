//! Inbound gateway messages and telemetry control requests.
//!
//! Inbound frames are JSON objects discriminated by a `type` field. Every
//! frame is decoded into [`InboundMessage`] at the transport boundary so the
//! reconciler only ever sees typed data. Discriminants this client does not
//! know decode to [`InboundMessage::Unknown`] instead of failing, so newer
//! gateway flows cannot break older clients.

use serde::{Deserialize, Serialize};

use crate::alert::AlertPatch;
use crate::equipment::EquipmentPatch;
use crate::error::SyncError;
use crate::sensor::{Sensor, SensorPatch};

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Partial update of one sensor.
    SensorUpdate(SensorPatch),
    /// Authoritative replacement of the whole sensor collection.
    SensorsList { data: Vec<Sensor> },
    /// Partial update of one equipment item.
    EquipmentUpdate(EquipmentPatch),
    /// Partial update of one alert.
    AlertUpdate(AlertPatch),
    /// Echo of a command, or a command notification from another client.
    Command(serde_json::Map<String, serde_json::Value>),
    /// Any discriminant this client does not handle.
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Decode a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Protocol`] when the frame is not valid JSON, has
    /// no `type` field, or a known kind carries malformed fields.
    pub fn parse(raw: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Wire discriminant, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SensorUpdate(_) => "sensor_update",
            Self::SensorsList { .. } => "sensors_list",
            Self::EquipmentUpdate(_) => "equipment_update",
            Self::AlertUpdate(_) => "alert_update",
            Self::Command(_) => "command",
            Self::Unknown => "unknown",
        }
    }
}

/// Control request sent on the telemetry channel as a bare JSON string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryRequest {
    /// Ask the gateway to push its full sensor snapshot.
    GetSensors,
}

impl TelemetryRequest {
    /// The action token.
    #[must_use]
    pub fn action(self) -> &'static str {
        match self {
            Self::GetSensors => "get_sensors",
        }
    }

    /// JSON-encoded frame, e.g. `"get_sensors"` including the quotes.
    #[must_use]
    pub fn to_frame(self) -> String {
        format!("\"{}\"", self.action())
    }
}
