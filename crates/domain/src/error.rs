//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`SyncError`]
//! via `From` when crossing a port boundary.

use std::error::Error as StdError;

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Top-level error for the synchronization client.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A domain invariant was violated.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// The gateway connection failed (refused, dropped, write failure).
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The REST collaborator rejected or failed a request.
    #[error("backend error: {0}")]
    Backend(#[source] BoxError),

    /// A wire message could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("email must not be empty")]
    EmptyEmail,

    #[error("unit must not be empty")]
    EmptyUnit,

    #[error("minimum threshold is greater than maximum threshold")]
    InvertedThresholds,
}

/// A lookup by id found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of record (e.g. `"Equipment"`).
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}
