//! WebSocket adapter error types.

use roomlink_domain::error::SyncError;
use tokio_tungstenite::tungstenite;

/// Errors specific to the WebSocket adapter.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    /// The handshake with the gateway failed or the socket was refused.
    #[error("WebSocket connection to {url} failed")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    /// The gateway did not complete the handshake in time.
    #[error("timed out connecting to {url}")]
    Timeout { url: String },

    /// Reading from an open socket failed.
    #[error("WebSocket read failed")]
    Read(#[source] tungstenite::Error),

    /// Writing to an open socket failed.
    #[error("WebSocket write failed")]
    Write(#[source] tungstenite::Error),
}

impl WsError {
    /// Convert into a [`SyncError::Transport`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> SyncError {
        SyncError::Transport(Box::new(self))
    }
}

impl From<WsError> for SyncError {
    fn from(err: WsError) -> Self {
        err.into_domain()
    }
}
