//! Command encoder — one canonical wire envelope per command intent.

use roomlink_domain::command::{ANONYMOUS_ACTOR, CommandEnvelope, CommandIntent, EnvelopeKind};
use roomlink_domain::time::{Timestamp, now};

/// Turns [`CommandIntent`]s into [`CommandEnvelope`]s.
///
/// Encoding never fails. The timestamp is taken when the envelope is
/// built, not when it is written to the socket.
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    default_actor: String,
}

impl Default for CommandEncoder {
    fn default() -> Self {
        Self::new(ANONYMOUS_ACTOR)
    }
}

impl CommandEncoder {
    /// Encoder stamping `default_actor` on intents that name no actor.
    #[must_use]
    pub fn new(default_actor: impl Into<String>) -> Self {
        Self {
            default_actor: default_actor.into(),
        }
    }

    #[must_use]
    pub fn default_actor(&self) -> &str {
        &self.default_actor
    }

    /// Encode with the current time.
    #[must_use]
    pub fn encode(&self, intent: &CommandIntent) -> CommandEnvelope {
        self.encode_at(intent, now())
    }

    /// Encode with an explicit timestamp.
    #[must_use]
    pub fn encode_at(&self, intent: &CommandIntent, timestamp: Timestamp) -> CommandEnvelope {
        if intent.target_id.is_none() && !intent.verb.is_create() {
            tracing::debug!(verb = %intent.verb, "encoding command without target id");
        }
        let user_id = intent
            .meta
            .user_id
            .clone()
            .unwrap_or_else(|| self.default_actor.clone());

        CommandEnvelope {
            kind: EnvelopeKind::Command,
            command: intent.verb,
            target: intent.target,
            equipment_id: intent.target_id.clone(),
            user_id,
            timestamp,
            status: intent.payload.status,
            value: intent.payload.value,
            payload: intent.payload,
            meta: intent.meta.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use roomlink_domain::command::{ActorMeta, CommandVerb, TargetKind};
    use roomlink_domain::equipment::{EquipmentChanges, PowerStatus};
    use roomlink_domain::id::EquipmentId;

    #[test]
    fn should_encode_equipment_toggle_with_all_fields() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let intent = CommandIntent::equipment(
            EquipmentId::new(2),
            CommandVerb::Toggle,
            EquipmentChanges::status(PowerStatus::Off),
        )
        .with_meta(ActorMeta::user("u1"));

        let envelope = CommandEncoder::default().encode_at(&intent, at);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["type"], "command");
        assert_eq!(json["command"], "toggle");
        assert_eq!(json["target"], "equipment");
        assert_eq!(json["equipmentId"], 2);
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["timestamp"], "2024-03-01T08:30:00Z");
        assert_eq!(json["status"], "off");
        assert!(json.get("value").is_none());
        assert_eq!(json["payload"]["status"], "off");
        assert_eq!(json["meta"]["userId"], "u1");
    }

    #[test]
    fn should_fall_back_to_default_actor() {
        let intent = CommandIntent::new(CommandVerb::Create, TargetKind::Room);

        let anonymous = CommandEncoder::default().encode(&intent);
        let configured = CommandEncoder::new("ops-7").encode(&intent);

        assert_eq!(anonymous.user_id, "u1");
        assert_eq!(configured.user_id, "ops-7");
    }

    #[test]
    fn should_prefer_actor_from_intent() {
        let intent = CommandIntent::new(CommandVerb::Delete, TargetKind::Sensor)
            .with_target_id(roomlink_domain::id::SensorId::new("s4"))
            .with_meta(ActorMeta::user("admin-1"));

        let envelope = CommandEncoder::new("u1").encode(&intent);

        assert_eq!(envelope.user_id, "admin-1");
    }

    #[test]
    fn should_omit_target_for_create_without_id() {
        let intent = CommandIntent::new(CommandVerb::Create, TargetKind::Equipment);
        let json = serde_json::to_value(CommandEncoder::default().encode(&intent)).unwrap();
        assert!(json.get("equipmentId").is_none());
    }

    #[test]
    fn should_stamp_encode_time() {
        let before = now();
        let envelope = CommandEncoder::default().encode(&CommandIntent::new(
            CommandVerb::Update,
            TargetKind::Equipment,
        ));
        assert!(envelope.timestamp >= before);
        assert!(envelope.timestamp <= now());
    }
}
