//! # roomlink-app
//!
//! Application layer — the synchronization core and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `GatewayConnector` / `GatewayLink` — duplex text channels to the gateway
//!   - `BackendApi` — request/response calls against the REST backend
//! - Provide the synchronization components:
//!   - `TransportSession` — per-channel connection lifecycle and reconnect policy
//!   - `CommandEncoder` — command intents to wire envelopes
//!   - `InboundDispatcher` — routes decoded gateway messages to the store
//!   - `EntityStore` — the single owner of client-side state and merge rules
//!   - `SyncFacade` — the one entry point the presentation layer talks to
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `roomlink-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod encoder;
pub mod event_bus;
pub mod facade;
pub mod ports;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
