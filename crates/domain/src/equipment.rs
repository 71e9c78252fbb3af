//! Equipment — a controllable (or merely observable) device in a room.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, ValidationError};
use crate::id::EquipmentId;
use crate::time::{Timestamp, now};
use crate::wire::{opt_string_or_number, string_or_number};

/// Family of equipment. The meaning of [`Equipment::value`] depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentKind {
    /// `value` is the temperature set-point.
    Hvac,
    /// `value` is the intensity percentage.
    Lighting,
    Door,
    Security,
    Ventilation,
    #[default]
    #[serde(other)]
    Other,
}

/// Binary power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerStatus {
    On,
    #[default]
    Off,
}

impl PowerStatus {
    /// The opposite state.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }

    /// Whether the equipment is powered.
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// An equipment item as returned by `GET /equipment` or pushed by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: EquipmentKind,
    #[serde(default, deserialize_with = "string_or_number")]
    pub room: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub floor: String,
    #[serde(default)]
    pub status: PowerStatus,
    #[serde(default)]
    pub controllable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default = "now")]
    pub last_update: Timestamp,
}

impl Equipment {
    /// Create a builder for constructing an [`Equipment`] item.
    #[must_use]
    pub fn builder() -> EquipmentBuilder {
        EquipmentBuilder::default()
    }

    /// Shallow-merge a partial update: every field present in `patch` wins.
    pub fn apply(&mut self, patch: EquipmentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(room) = patch.room {
            self.room = room;
        }
        if let Some(floor) = patch.floor {
            self.floor = floor;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(controllable) = patch.controllable {
            self.controllable = controllable;
        }
        if let Some(value) = patch.value {
            self.value = Some(value);
        }
        if let Some(last_update) = patch.last_update {
            self.last_update = last_update;
        }
    }

    /// Apply a local optimistic edit and stamp `last_update` with `at`.
    pub fn apply_local(&mut self, changes: &EquipmentChanges, at: Timestamp) {
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(value) = changes.value {
            self.value = Some(value);
        }
        self.last_update = at;
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Partial equipment update carried by an `equipment_update` message.
///
/// The kind is not patchable: `type` on the wire is the message discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentPatch {
    pub id: EquipmentId,
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
    pub status: Option<PowerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controllable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Timestamp>,
}

impl EquipmentPatch {
    /// An empty patch for the given item.
    #[must_use]
    pub fn new(id: EquipmentId) -> Self {
        Self {
            id,
            name: None,
            room: None,
            floor: None,
            status: None,
            controllable: None,
            value: None,
            last_update: None,
        }
    }

    #[must_use]
    pub fn status(mut self, status: PowerStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// A local edit requested from the UI (toggle or set-point change).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EquipmentChanges {
    pub status: Option<PowerStatus>,
    pub value: Option<f64>,
}

impl EquipmentChanges {
    /// Change the power status only.
    #[must_use]
    pub fn status(status: PowerStatus) -> Self {
        Self {
            status: Some(status),
            value: None,
        }
    }

    /// Change the continuous value only.
    #[must_use]
    pub fn value(value: f64) -> Self {
        Self {
            status: None,
            value: Some(value),
        }
    }
}

/// Step-by-step builder for [`Equipment`].
#[derive(Debug, Default)]
pub struct EquipmentBuilder {
    id: Option<EquipmentId>,
    name: Option<String>,
    kind: EquipmentKind,
    room: Option<String>,
    floor: Option<String>,
    status: PowerStatus,
    controllable: bool,
    value: Option<f64>,
}

impl EquipmentBuilder {
    #[must_use]
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(EquipmentId::new(id));
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: EquipmentKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn location(mut self, room: impl Into<String>, floor: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self.floor = Some(floor.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: PowerStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn controllable(mut self, controllable: bool) -> Self {
        self.controllable = controllable;
        self
    }

    #[must_use]
    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Consume the builder, validate, and return an [`Equipment`] item.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Equipment, SyncError> {
        let equipment = Equipment {
            id: self.id.unwrap_or(EquipmentId::new(0)),
            name: self.name.unwrap_or_default(),
            kind: self.kind,
            room: self.room.unwrap_or_default(),
            floor: self.floor.unwrap_or_default(),
            status: self.status,
            controllable: self.controllable,
            value: self.value,
            last_update: now(),
        };
        equipment.validate()?;
        Ok(equipment)
    }
}
