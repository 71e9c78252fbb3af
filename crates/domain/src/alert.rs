//! Alert — a notification raised about a sensor, an equipment item, or the
//! building in general.
//!
//! Acknowledgment is monotonic: once `acknowledged` is `true` nothing in
//! this crate sets it back to `false`.

use serde::{Deserialize, Serialize};

use crate::id::{AlertId, EquipmentId, SensorId};
use crate::time::{Timestamp, now};

/// Severity class (wire field `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Error,
    Info,
}

/// Handling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    #[default]
    Low,
    Medium,
    High,
}

/// What an alert is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertSource {
    Sensor(SensorId),
    Equipment(EquipmentId),
}

/// An alert as returned by `GET /alert` or pushed by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    #[serde(default)]
    pub priority: AlertPriority,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<SensorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<EquipmentId>,
    #[serde(default = "now")]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub acknowledged: bool,
}

impl Alert {
    /// A fresh, unacknowledged alert stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<AlertId>,
        severity: AlertSeverity,
        priority: AlertPriority,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            priority,
            message: message.into(),
            sensor_id: None,
            equipment_id: None,
            timestamp: now(),
            acknowledged: false,
        }
    }

    /// The referenced sensor or equipment item, sensor first.
    #[must_use]
    pub fn source(&self) -> Option<AlertSource> {
        self.sensor_id
            .clone()
            .map(AlertSource::Sensor)
            .or_else(|| self.equipment_id.map(AlertSource::Equipment))
    }

    /// Mark the alert as acknowledged.
    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }

    /// Shallow-merge a partial update.
    ///
    /// `acknowledged: false` in a patch is ignored when the alert is
    /// already acknowledged.
    pub fn apply(&mut self, patch: AlertPatch) {
        if let Some(severity) = patch.severity {
            self.severity = severity;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(sensor_id) = patch.sensor_id {
            self.sensor_id = Some(sensor_id);
        }
        if let Some(equipment_id) = patch.equipment_id {
            self.equipment_id = Some(equipment_id);
        }
        if let Some(timestamp) = patch.timestamp {
            self.timestamp = timestamp;
        }
        if patch.acknowledged == Some(true) {
            self.acknowledge();
        }
    }
}

/// Partial alert update carried by an `alert_update` message.
///
/// Severity travels as `severity` here because `type` is the message
/// discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPatch {
    pub id: AlertId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<AlertSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<AlertPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<SensorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<EquipmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
}

impl AlertPatch {
    /// An empty patch for the given alert.
    #[must_use]
    pub fn new(id: AlertId) -> Self {
        Self {
            id,
            severity: None,
            priority: None,
            message: None,
            sensor_id: None,
            equipment_id: None,
            timestamp: None,
            acknowledged: None,
        }
    }
}
