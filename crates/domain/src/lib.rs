//! # roomlink-domain
//!
//! Pure domain model for the roomlink building-management sync client.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the live entities (**sensors**, **equipment**, **alerts**) and
//!   their merge rules
//! - Define the request/response records (**rooms**, **users**)
//! - Define the wire protocol: inbound gateway messages and the outbound
//!   command envelope
//! - Define the connection lifecycle and change notifications
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;
mod wire;

pub mod alert;
pub mod command;
pub mod connection;
pub mod equipment;
pub mod event;
pub mod message;
pub mod room;
pub mod sensor;
pub mod user;
