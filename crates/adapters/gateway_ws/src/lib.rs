//! # roomlink-adapter-gateway-ws
//!
//! WebSocket adapter for the gateway ports.
//!
//! ## Responsibilities
//! - Open one WebSocket per gateway channel (equipment commands, sensor
//!   telemetry)
//! - Move text frames in both directions, answering pings transparently
//! - Map tungstenite failures to transport errors
//!
//! Connection lifecycle (states, reconnect policy, greeting) belongs to
//! the transport session in `roomlink-app`; this crate only knows how to
//! open a single link.
//!
//! ## Dependency rule
//! Depends on `roomlink-app` (port traits) and `roomlink-domain`.

pub mod config;
pub mod error;
mod link;

pub use config::GatewayConfig;
pub use error::WsError;
pub use link::{WsConnector, WsLink};
