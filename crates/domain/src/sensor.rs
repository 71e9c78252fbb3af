//! Sensor — a measuring point reporting a single value in a fixed unit.

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, ValidationError};
use crate::id::{RoomId, SensorId};
use crate::time::{Timestamp, now};
use crate::wire::{opt_string_or_number, string_or_number};

/// What a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Co2,
    Light,
    Noise,
    Pressure,
}

/// Operating status reported for a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    #[default]
    Active,
    Inactive,
    Error,
}

/// Position of the current value relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdState {
    Below,
    Within,
    Above,
}

/// A sensor as pushed by the gateway or returned by `GET /sensor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: SensorId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SensorKind,
    #[serde(default, deserialize_with = "string_or_number")]
    pub room: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub floor: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub status: SensorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_threshold: Option<f64>,
    #[serde(default = "now")]
    pub last_update: Timestamp,
}

impl Sensor {
    /// Create a builder for constructing a [`Sensor`].
    #[must_use]
    pub fn builder() -> SensorBuilder {
        SensorBuilder::default()
    }

    /// Current value together with its unit.
    #[must_use]
    pub fn reading(&self) -> (f64, &str) {
        (self.value, &self.unit)
    }

    /// Compare the current value against the thresholds.
    ///
    /// Thresholds are expressed in the sensor's own unit, so no conversion
    /// takes place.
    #[must_use]
    pub fn threshold_state(&self) -> ThresholdState {
        match (self.min_threshold, self.max_threshold) {
            (Some(min), _) if self.value < min => ThresholdState::Below,
            (_, Some(max)) if self.value > max => ThresholdState::Above,
            _ => ThresholdState::Within,
        }
    }

    /// Shallow-merge a partial update: every field present in `patch` wins.
    ///
    /// A patch carrying a new value without a unit keeps the current unit.
    pub fn apply(&mut self, patch: SensorPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(room) = patch.room {
            self.room = room;
        }
        if let Some(floor) = patch.floor {
            self.floor = floor;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(min) = patch.min_threshold {
            self.min_threshold = Some(min);
        }
        if let Some(max) = patch.max_threshold {
            self.max_threshold = Some(max);
        }
        if let Some(last_update) = patch.last_update {
            self.last_update = last_update;
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when the name is empty or the
    /// thresholds are inverted.
    pub fn validate(&self) -> Result<(), SyncError> {
        validate_fields(&self.name, self.min_threshold, self.max_threshold)
    }
}

fn validate_fields(name: &str, min: Option<f64>, max: Option<f64>) -> Result<(), SyncError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName.into());
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ValidationError::InvertedThresholds.into());
        }
    }
    Ok(())
}

/// Partial sensor update carried by a `sensor_update` message.
///
/// The kind is not patchable: `type` on the wire is the message discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorPatch {
    pub id: SensorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub room: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SensorStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Timestamp>,
}

impl SensorPatch {
    /// An empty patch for the given sensor.
    #[must_use]
    pub fn new(id: SensorId) -> Self {
        Self {
            id,
            name: None,
            room: None,
            floor: None,
            value: None,
            unit: None,
            status: None,
            min_threshold: None,
            max_threshold: None,
            last_update: None,
        }
    }
}

/// Payload for `POST /sensors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSensor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SensorKind,
    pub room: String,
    pub floor: String,
    pub value: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_threshold: Option<f64>,
    #[serde(rename = "room_id", skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
}

impl NewSensor {
    /// Check domain invariants before the payload leaves the client.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when the name or unit is empty or
    /// the thresholds are inverted.
    pub fn validate(&self) -> Result<(), SyncError> {
        validate_fields(&self.name, self.min_threshold, self.max_threshold)?;
        if self.unit.trim().is_empty() {
            return Err(ValidationError::EmptyUnit.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Sensor`].
#[derive(Debug, Default)]
pub struct SensorBuilder {
    id: Option<SensorId>,
    name: Option<String>,
    kind: Option<SensorKind>,
    room: Option<String>,
    floor: Option<String>,
    value: Option<f64>,
    unit: Option<String>,
    status: Option<SensorStatus>,
    min_threshold: Option<f64>,
    max_threshold: Option<f64>,
}

impl SensorBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<SensorId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: SensorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn location(mut self, room: impl Into<String>, floor: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self.floor = Some(floor.into());
        self
    }

    #[must_use]
    pub fn reading(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.value = Some(value);
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: SensorStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn thresholds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_threshold = min;
        self.max_threshold = max;
        self
    }

    /// Consume the builder, validate, and return a [`Sensor`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] if the name is missing or the
    /// thresholds are inverted.
    pub fn build(self) -> Result<Sensor, SyncError> {
        let sensor = Sensor {
            id: self.id.unwrap_or_else(|| SensorId::new(String::new())),
            name: self.name.unwrap_or_default(),
            kind: self.kind.unwrap_or(SensorKind::Temperature),
            room: self.room.unwrap_or_default(),
            floor: self.floor.unwrap_or_default(),
            value: self.value.unwrap_or_default(),
            unit: self.unit.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            min_threshold: self.min_threshold,
            max_threshold: self.max_threshold,
            last_update: now(),
        };
        sensor.validate()?;
        Ok(sensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thermometer() -> Sensor {
        Sensor::builder()
            .id("s1")
            .name("Salle B12")
            .kind(SensorKind::Temperature)
            .location("B12", "1")
            .reading(21.5, "°C")
            .thresholds(Some(18.0), Some(26.0))
            .build()
            .unwrap()
    }

    #[test]
    fn should_read_value_and_unit_together() {
        let sensor = thermometer();
        assert_eq!(sensor.reading(), (21.5, "°C"));
    }

    #[test]
    fn should_report_within_when_between_thresholds() {
        assert_eq!(thermometer().threshold_state(), ThresholdState::Within);
    }

    #[test]
    fn should_report_above_when_over_max() {
        let mut sensor = thermometer();
        sensor.value = 30.0;
        assert_eq!(sensor.threshold_state(), ThresholdState::Above);
    }

    #[test]
    fn should_report_below_when_under_min() {
        let mut sensor = thermometer();
        sensor.value = 10.0;
        assert_eq!(sensor.threshold_state(), ThresholdState::Below);
    }

    #[test]
    fn should_report_within_when_no_thresholds() {
        let mut sensor = thermometer();
        sensor.min_threshold = None;
        sensor.max_threshold = None;
        sensor.value = 1000.0;
        assert_eq!(sensor.threshold_state(), ThresholdState::Within);
    }

    #[test]
    fn should_keep_unpatched_fields_when_applying_patch() {
        let mut sensor = thermometer();
        let mut patch = SensorPatch::new(sensor.id.clone());
        patch.value = Some(23.0);
        sensor.apply(patch);

        assert_eq!(sensor.reading(), (23.0, "°C"));
        assert_eq!(sensor.name, "Salle B12");
        assert_eq!(sensor.min_threshold, Some(18.0));
    }

    #[test]
    fn should_reject_inverted_thresholds() {
        let result = Sensor::builder()
            .name("x")
            .thresholds(Some(30.0), Some(10.0))
            .build();
        assert!(matches!(
            result,
            Err(SyncError::Validation(ValidationError::InvertedThresholds))
        ));
    }

    #[test]
    fn should_reject_empty_name() {
        let result = Sensor::builder().build();
        assert!(matches!(
            result,
            Err(SyncError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_deserialize_gateway_record() {
        let json = r#"{
            "id": 3,
            "name": "CO2 hall",
            "type": "co2",
            "room": "Hall",
            "floor": 0,
            "value": 612,
            "unit": "ppm",
            "status": "active",
            "maxThreshold": 1000,
            "lastUpdate": "2024-05-01T08:30:00Z"
        }"#;
        let sensor: Sensor = serde_json::from_str(json).unwrap();
        assert_eq!(sensor.id, SensorId::new("3"));
        assert_eq!(sensor.kind, SensorKind::Co2);
        assert_eq!(sensor.floor, "0");
        assert_eq!(sensor.reading(), (612.0, "ppm"));
        assert_eq!(sensor.min_threshold, None);
        assert_eq!(sensor.max_threshold, Some(1000.0));
    }

    #[test]
    fn should_reject_unknown_sensor_kind() {
        let json = r#"{"id": "s", "name": "n", "type": "radiation"}"#;
        assert!(serde_json::from_str::<Sensor>(json).is_err());
    }

    #[test]
    fn should_serialize_new_sensor_with_room_id() {
        let new = NewSensor {
            name: "Hum".to_string(),
            kind: SensorKind::Humidity,
            room: "B12".to_string(),
            floor: "1".to_string(),
            value: 0.0,
            unit: "%".to_string(),
            min_threshold: Some(30.0),
            max_threshold: None,
            room_id: Some(RoomId::new("room-1")),
        };
        let json = serde_json::to_value(&new).unwrap();
        assert_eq!(json["type"], "humidity");
        assert_eq!(json["minThreshold"], 30.0);
        assert_eq!(json["room_id"], "room-1");
        assert!(json.get("maxThreshold").is_none());
    }

    #[test]
    fn should_reject_new_sensor_without_unit() {
        let new = NewSensor {
            name: "Hum".to_string(),
            kind: SensorKind::Humidity,
            room: String::new(),
            floor: String::new(),
            value: 0.0,
            unit: " ".to_string(),
            min_threshold: None,
            max_threshold: None,
            room_id: None,
        };
        assert!(matches!(
            new.validate(),
            Err(SyncError::Validation(ValidationError::EmptyUnit))
        ));
    }
}
