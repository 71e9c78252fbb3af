//! Gateway channels and their connection lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical duplex channel to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Command traffic plus equipment and alert updates.
    Equipment,
    /// Sensor telemetry.
    Telemetry,
}

impl Channel {
    /// Every channel, in connection order.
    pub const ALL: [Self; 2] = [Self::Equipment, Self::Telemetry];
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equipment => f.write_str("equipment"),
            Self::Telemetry => f.write_str("telemetry"),
        }
    }
}

/// Lifecycle of one connection: `Connecting → Open → Closing → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    #[default]
    Closed,
}

impl ConnectionState {
    /// Whether frames can be written.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Closing => f.write_str("closing"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_closed() {
        assert_eq!(ConnectionState::default(), ConnectionState::Closed);
    }

    #[test]
    fn should_only_report_open_when_open() {
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Connecting.is_open());
        assert!(!ConnectionState::Closing.is_open());
    }

    #[test]
    fn should_display_channel_name() {
        assert_eq!(Channel::Telemetry.to_string(), "telemetry");
    }
}
