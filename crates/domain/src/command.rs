//! Command intents and the outbound command envelope.
//!
//! A [`CommandIntent`] is what the UI asks for; a [`CommandEnvelope`] is the
//! single wire shape the gateway accepts for every verb.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::equipment::{EquipmentChanges, PowerStatus};
use crate::id::{EquipmentId, SensorId};
use crate::time::Timestamp;
use crate::user::UserRole;

/// Actor id used when the intent does not name one.
pub const ANONYMOUS_ACTOR: &str = "u1";

/// What to do with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandVerb {
    Toggle,
    Update,
    Create,
    Delete,
}

impl CommandVerb {
    /// Whether the verb creates a record, in which case no target id is needed.
    #[must_use]
    pub fn is_create(self) -> bool {
        matches!(self, Self::Create)
    }
}

impl fmt::Display for CommandVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toggle => "toggle",
            Self::Update => "update",
            Self::Create => "create",
            Self::Delete => "delete",
        })
    }
}

/// Which kind of record a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Equipment,
    Sensor,
    Room,
    User,
    Alert,
}

/// Target id as it appears on the wire: numeric for equipment, textual
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetId {
    Number(i64),
    Text(String),
}

impl From<EquipmentId> for TargetId {
    fn from(id: EquipmentId) -> Self {
        Self::Number(id.get())
    }
}

impl From<SensorId> for TargetId {
    fn from(id: SensorId) -> Self {
        Self::Text(id.to_string())
    }
}

/// Data body of a command.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PowerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl From<EquipmentChanges> for CommandPayload {
    fn from(changes: EquipmentChanges) -> Self {
        Self {
            status: changes.status,
            value: changes.value,
        }
    }
}

/// Who issued the command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl ActorMeta {
    /// Metadata naming only the actor.
    #[must_use]
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            role: None,
        }
    }
}

/// An outbound request for a change. Lives only for the duration of a send.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandIntent {
    pub verb: CommandVerb,
    pub target: TargetKind,
    /// Optional only for [`CommandVerb::Create`].
    pub target_id: Option<TargetId>,
    pub payload: CommandPayload,
    pub meta: ActorMeta,
}

impl CommandIntent {
    /// An intent with an empty payload and anonymous actor.
    #[must_use]
    pub fn new(verb: CommandVerb, target: TargetKind) -> Self {
        Self {
            verb,
            target,
            target_id: None,
            payload: CommandPayload::default(),
            meta: ActorMeta::default(),
        }
    }

    /// An equipment command carrying the requested changes.
    #[must_use]
    pub fn equipment(id: EquipmentId, verb: CommandVerb, changes: EquipmentChanges) -> Self {
        Self::new(verb, TargetKind::Equipment)
            .with_target_id(id)
            .with_payload(changes.into())
    }

    #[must_use]
    pub fn with_target_id(mut self, id: impl Into<TargetId>) -> Self {
        self.target_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: CommandPayload) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: ActorMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Discriminant marking an outbound message as a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Command,
}

/// The wire message sent to the gateway for every command verb.
///
/// `status` and `value` are duplicated at the top level because the gateway
/// flows read them there; `payload` carries the same data nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub command: CommandVerb,
    pub target: TargetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<TargetId>,
    pub user_id: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PowerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default)]
    pub payload: CommandPayload,
    #[serde(default)]
    pub meta: ActorMeta,
}
