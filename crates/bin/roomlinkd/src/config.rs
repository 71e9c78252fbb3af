//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `roomlink.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use roomlink_adapter_gateway_ws::GatewayConfig;
use roomlink_adapter_rest_reqwest::RestConfig;
use roomlink_domain::command::ANONYMOUS_ACTOR;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gateway WebSocket channels.
    pub gateway: GatewayConfig,
    /// REST collaborator.
    pub api: RestConfig,
    /// Identity stamped on outbound commands.
    pub actor: ActorConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Capacity of the change broadcast.
    pub event_capacity: usize,
}

/// Who is issuing commands.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Fallback `userId` when a command carries no actor metadata.
    pub user_id: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `roomlink.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("roomlink.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ROOMLINK_GATEWAY_EQUIPMENT_URL") {
            self.gateway.equipment_url = val;
        }
        if let Ok(val) = std::env::var("ROOMLINK_GATEWAY_SENSOR_URL") {
            self.gateway.sensor_url = val;
        }
        if let Ok(val) = std::env::var("ROOMLINK_MAX_RECONNECT_ATTEMPTS")
            && let Ok(attempts) = val.parse()
        {
            self.gateway.max_reconnect_attempts = attempts;
        }
        if let Ok(val) = std::env::var("ROOMLINK_API_URL") {
            self.api.base_url = val;
        }
        if let Ok(val) = std::env::var("ROOMLINK_USER_ID") {
            self.actor.user_id = val;
        }
        if let Ok(val) = std::env::var("ROOMLINK_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for url in [&self.gateway.equipment_url, &self.gateway.sensor_url] {
            // the websocket client is built without TLS
            if !url.starts_with("ws://") {
                return Err(ConfigError::Validation(format!(
                    "gateway url {url:?} must use ws://"
                )));
            }
        }
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "api url {:?} must use http:// or https://",
                self.api.base_url
            )));
        }
        if self.gateway.max_reconnect_attempts == 0 {
            return Err(ConfigError::Validation(
                "max_reconnect_attempts must be non-zero".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Validation(
                "event_capacity must be non-zero".to_string(),
            ));
        }
        if self.actor.user_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "actor user_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            api: RestConfig::default(),
            actor: ActorConfig::default(),
            logging: LoggingConfig::default(),
            event_capacity: 256,
        }
    }
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            user_id: ANONYMOUS_ACTOR.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "roomlinkd=info,roomlink=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
