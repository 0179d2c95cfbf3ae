//! Socket seam between the session state machine and the network.
//!
//! [`SessionClient`](crate::SessionClient) only sees [`Connector`] and
//! [`Transport`]; [`WsConnector`] provides them over `tokio-tungstenite`.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::session::SessionError;

/// Something that happened on an open connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Raw bytes of one socket message.
    Message(Vec<u8>),
    /// The peer closed the connection or the stream ended.
    Closed,
}

/// An open, bidirectional connection.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Send one encoded frame.
    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), SessionError>;

    /// Wait for the next message or close.
    async fn next_event(&mut self) -> Result<TransportEvent, SessionError>;
}

/// Opens connections to an endpoint.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    async fn connect(&self, endpoint: &str) -> Result<Self::Transport, SessionError>;
}

/// Connects over (secure) WebSocket.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

/// A WebSocket connection carrying binary frames.
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, endpoint: &str) -> Result<WsTransport, SessionError> {
        let (stream, _) = connect_async(endpoint)
            .await
            .map_err(|error| SessionError::Connect(Box::new(error)))?;
        Ok(WsTransport { stream })
    }
}

#[async_trait::async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), SessionError> {
        self.stream
            .send(Message::Binary(bytes.into()))
            .await
            .map_err(|error| SessionError::Send(Box::new(error)))
    }

    async fn next_event(&mut self) -> Result<TransportEvent, SessionError> {
        loop {
            let Some(message) = self.stream.next().await else {
                return Ok(TransportEvent::Closed);
            };
            match message.map_err(|error| SessionError::Receive(Box::new(error)))? {
                Message::Binary(bytes) => return Ok(TransportEvent::Message(bytes.to_vec())),
                // The server only sends binary frames; text is decoded the same way.
                Message::Text(text) => return Ok(TransportEvent::Message(text.as_bytes().to_vec())),
                Message::Close(frame) => {
                    debug!(?frame, "ws: close frame received");
                    return Ok(TransportEvent::Closed);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }
}
