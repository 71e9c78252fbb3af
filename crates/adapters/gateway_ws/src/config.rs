//! Gateway connection configuration.

use std::time::Duration;

use serde::Deserialize;

use roomlink_app::session::SessionConfig;
use roomlink_domain::connection::Channel;

/// Configuration for the gateway WebSocket channels.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Channel carrying commands plus equipment and alert updates.
    pub equipment_url: String,
    /// Channel carrying sensor telemetry.
    pub sensor_url: String,
    /// Unit of the linear reconnect backoff, in milliseconds.
    pub reconnect_base_delay_ms: u64,
    /// Consecutive reconnect attempts before a channel is degraded.
    pub max_reconnect_attempts: u32,
    /// Handshake timeout, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            equipment_url: "ws://localhost:1880/ws/equipement".to_string(),
            sensor_url: "ws://localhost:1880/ws/sensor".to_string(),
            reconnect_base_delay_ms: 1000,
            max_reconnect_attempts: 5,
            connect_timeout_secs: 10,
        }
    }
}

impl GatewayConfig {
    /// Endpoint of `channel`.
    #[must_use]
    pub fn url(&self, channel: Channel) -> &str {
        match channel {
            Channel::Equipment => &self.equipment_url,
            Channel::Telemetry => &self.sensor_url,
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Transport session settings derived from this configuration.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
            max_attempts: self.max_reconnect_attempts,
            ..SessionConfig::default()
        }
    }
}
