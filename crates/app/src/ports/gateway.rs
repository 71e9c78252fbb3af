//! Gateway port — duplex text channels to the real-time gateway.
//!
//! The transport session owns the connection lifecycle (states, reconnect
//! policy, greeting). Adapters only know how to open one link and move
//! text frames over it.

use std::future::Future;
use std::sync::Arc;

use roomlink_domain::connection::Channel;
use roomlink_domain::error::SyncError;

/// Opens links to the gateway, one per channel.
pub trait GatewayConnector: Send + Sync + 'static {
    /// Link type produced by a successful connect.
    type Link: GatewayLink;

    /// Open a new link for `channel`.
    fn connect(
        &self,
        channel: Channel,
    ) -> impl Future<Output = Result<Self::Link, SyncError>> + Send;
}

/// An open duplex text link.
pub trait GatewayLink: Send + 'static {
    /// Write one text frame.
    fn send(&mut self, frame: String) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Wait for the next text frame.
    ///
    /// Returns `None` once the remote end has closed the link. Control
    /// frames (ping/pong) are handled by the adapter and never surface here.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, SyncError>>> + Send;

    /// Close the link gracefully. Errors during close are not reported.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

impl<T: GatewayConnector> GatewayConnector for Arc<T> {
    type Link = T::Link;

    fn connect(
        &self,
        channel: Channel,
    ) -> impl Future<Output = Result<Self::Link, SyncError>> + Send {
        (**self).connect(channel)
    }
}
