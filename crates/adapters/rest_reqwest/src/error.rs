//! REST adapter error types.

use roomlink_domain::error::{NotFoundError, SyncError};

/// Errors specific to the REST adapter.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The request could not be sent or the body could not be decoded.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered 404.
    #[error("{path} not found")]
    NotFound { path: String },
}

impl RestError {
    /// Convert into a [`SyncError`] for propagation across port
    /// boundaries. 404 maps to [`SyncError::NotFound`], everything else to
    /// [`SyncError::Backend`].
    pub fn into_domain(self) -> SyncError {
        match self {
            Self::NotFound { path } => NotFoundError {
                entity: "Resource",
                id: path,
            }
            .into(),
            other => SyncError::Backend(Box::new(other)),
        }
    }
}

impl From<RestError> for SyncError {
    fn from(err: RestError) -> Self {
        err.into_domain()
    }
}
