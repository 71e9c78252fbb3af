use std::future::Future;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use roomlink_app::ports::{GatewayConnector, GatewayLink};
use roomlink_domain::connection::Channel;
use roomlink_domain::error::SyncError;

use crate::config::GatewayConfig;
use crate::error::WsError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens gateway links over WebSocket.
#[derive(Debug, Clone)]
pub struct WsConnector {
    config: GatewayConfig,
}

impl WsConnector {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }
}

impl GatewayConnector for WsConnector {
    type Link = WsLink;

    fn connect(
        &self,
        channel: Channel,
    ) -> impl Future<Output = Result<Self::Link, SyncError>> + Send {
        let url = self.config.url(channel).to_string();
        let timeout = self.config.connect_timeout();
        async move {
            tracing::debug!(%channel, %url, "opening websocket");
            let handshake = tokio_tungstenite::connect_async(url.clone());
            let (socket, response) = match tokio::time::timeout(timeout, handshake).await {
                Ok(Ok(connected)) => connected,
                Ok(Err(source)) => return Err(WsError::Connect { url, source }.into()),
                Err(_) => return Err(WsError::Timeout { url }.into()),
            };
            tracing::debug!(%channel, status = %response.status(), "websocket handshake complete");
            Ok(WsLink { socket, url })
        }
    }
}

/// One open WebSocket to the gateway.
pub struct WsLink {
    socket: Socket,
    url: String,
}

impl WsLink {
    /// Endpoint this link is connected to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl GatewayLink for WsLink {
    fn send(&mut self, frame: String) -> impl Future<Output = Result<(), SyncError>> + Send {
        async move {
            self.socket
                .send(Message::text(frame))
                .await
                .map_err(|err| WsError::Write(err).into())
        }
    }

    fn recv(&mut self) -> impl Future<Output = Option<Result<String, SyncError>>> + Send {
        async move {
            loop {
                match self.socket.next().await? {
                    Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => return Some(Ok(text)),
                        Err(_) => {
                            tracing::warn!(url = %self.url, len = bytes.len(), "dropping non UTF-8 binary frame");
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        tracing::debug!(url = %self.url, ?frame, "gateway closed websocket");
                        return None;
                    }
                    Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                    Err(err) => return Some(Err(WsError::Read(err).into())),
                }
            }
        }
    }

    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            if let Err(err) = self.socket.close(None).await {
                tracing::debug!(url = %self.url, %err, "error while closing websocket");
            }
        }
    }
}
