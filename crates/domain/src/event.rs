//! Change notifications delivered to subscribers of the entity store.
//!
//! Events name *what* changed; subscribers read the new state from the
//! store snapshot rather than from the event.

use serde::{Deserialize, Serialize};

use crate::connection::Channel;
use crate::id::{AlertId, EquipmentId, RoomId, SensorId};

/// Something observable happened to the synchronized state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    SensorsReplaced { count: usize },
    SensorChanged { id: SensorId },
    SensorRemoved { id: SensorId },
    EquipmentReplaced { count: usize },
    EquipmentChanged { id: EquipmentId },
    EquipmentRemoved { id: EquipmentId },
    AlertsReplaced { count: usize },
    AlertChanged { id: AlertId },
    RoomsReplaced { count: usize },
    RoomRemoved { id: RoomId },
    UsersReplaced { count: usize },
    ChannelOpened { channel: Channel },
    ChannelClosed { channel: Channel },
    /// Reconnection attempts are exhausted; no automatic retry follows.
    Degraded { channel: Channel },
}
