//! # roomlink-adapter-rest-reqwest
//!
//! HTTP implementation of the `BackendApi` port.
//!
//! ## Responsibilities
//! - Fetch the collections the gateway never pushes in full (equipment,
//!   rooms, users, alerts) and the REST sensor seed
//! - Issue create/update/delete requests for sensors, equipment, rooms and
//!   users
//! - Acknowledge alerts
//! - Map HTTP failures to backend errors
//!
//! ## Dependency rule
//! Depends on `roomlink-app` (port traits) and `roomlink-domain`.

mod client;
pub mod config;
pub mod error;

pub use client::HttpBackend;
pub use config::RestConfig;
pub use error::RestError;
