//! Room — a physical space grouping sensors and equipment.
//!
//! Rooms are only ever loaded from the REST collaborator; the gateway never
//! pushes them.

use serde::{Deserialize, Serialize};

use crate::id::RoomId;
use crate::wire::string_or_number;

/// A room as returned by `GET /room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub floor: String,
    /// Surface in square metres.
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub sensors: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
}
