//! Session state machine for one broadcast connection.
//!
//! DESIGN
//! ======
//! `Disconnected -> Connecting -> Open -> Disconnected`. The transport lives
//! inside the `Open` state, so sending without a connection is unreachable
//! rather than guarded. One task drives everything: a `select!` yields either
//! the next transport event or a heartbeat tick, then the matching handler
//! runs with exclusive access to the session. Decoding never overlaps a
//! heartbeat send. While the sink is full, delivery waits on the consumer
//! and keeps servicing the heartbeat timer.
//!
//! ERROR HANDLING
//! ==============
//! Undecodable inbound frames are logged and skipped; the connection stays
//! up. Send failures end the session and are returned. A receive error or a
//! close ends the session normally. There is no reconnect.

use std::time::Duration;

use frames::{CodecError, DecodedMessage, Frame, encode_frame};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_tungstenite::tungstenite;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::transport::{Connector, Transport, TransportEvent, WsConnector};

/// Keepalive period. Fixed by the service, not configurable.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Receives one batch per inbound socket message, in arrival order.
pub type MessageSink = mpsc::Sender<Vec<DecodedMessage>>;

/// Transport failure that ends or prevents a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tungstenite::Error>),
    #[error("websocket send failed: {0}")]
    Send(Box<tungstenite::Error>),
    #[error("websocket receive failed: {0}")]
    Receive(Box<tungstenite::Error>),
}

/// Observable lifecycle state of a [`SessionClient`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No connection; heartbeat ticks are no-ops.
    Disconnected,
    /// Connect in progress.
    Connecting,
    /// Connected and joined; heartbeats are sent.
    Open,
}

enum Link<T> {
    Disconnected,
    Connecting,
    Open(T),
}

enum LoopEvent {
    Transport(Result<TransportEvent, SessionError>),
    Heartbeat,
}

/// Drives a single persistent connection for one room.
pub struct SessionClient<C: Connector> {
    connector: C,
    endpoint: String,
    pub(crate) heartbeat_interval: Duration,
    link: Link<C::Transport>,
}

impl SessionClient<WsConnector> {
    /// Session over WebSocket to `config.endpoint`.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_connector(WsConnector, config)
    }
}

impl<C: Connector> SessionClient<C> {
    /// Session over a custom [`Connector`].
    #[must_use]
    pub fn with_connector(connector: C, config: &SessionConfig) -> Self {
        Self {
            connector,
            endpoint: config.endpoint.clone(),
            heartbeat_interval: HEARTBEAT_INTERVAL,
            link: Link::Disconnected,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.link {
            Link::Disconnected => SessionState::Disconnected,
            Link::Connecting => SessionState::Connecting,
            Link::Open(_) => SessionState::Open,
        }
    }

    /// Connect, join `room_id` and deliver decoded batches to `sink` until
    /// the connection closes.
    ///
    /// Returns `Ok(())` when the peer closes, the stream ends, or the
    /// receiving half of `sink` is dropped. The session is `Disconnected`
    /// whenever this returns.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connect`] when the connection cannot be
    /// opened and [`SessionError::Send`] when the handshake or a heartbeat
    /// cannot be written.
    pub async fn run(&mut self, room_id: u64, sink: MessageSink) -> Result<(), SessionError> {
        self.link = Link::Connecting;
        info!(room_id, endpoint = %self.endpoint, "session: connecting");

        let transport = match self.connector.connect(&self.endpoint).await {
            Ok(transport) => transport,
            Err(error) => {
                self.link = Link::Disconnected;
                return Err(error);
            }
        };
        self.on_open(transport, room_id).await?;

        let mut heartbeat = interval_at(Instant::now() + self.heartbeat_interval, self.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = {
                let Link::Open(transport) = &mut self.link else {
                    break;
                };
                tokio::select! {
                    event = transport.next_event() => LoopEvent::Transport(event),
                    _ = heartbeat.tick() => LoopEvent::Heartbeat,
                }
            };

            match event {
                LoopEvent::Transport(Ok(TransportEvent::Message(bytes))) => {
                    if !self.deliver(&bytes, &sink, &mut heartbeat).await? {
                        info!(room_id, "session: sink dropped; closing");
                        self.on_close();
                    }
                }
                LoopEvent::Transport(Ok(TransportEvent::Closed)) => {
                    info!(room_id, "session: closed by peer");
                    self.on_close();
                }
                LoopEvent::Transport(Err(error)) => {
                    warn!(room_id, error = %error, "session: transport error; closing");
                    self.on_close();
                }
                LoopEvent::Heartbeat => self.on_heartbeat_tick().await?,
            }
        }

        Ok(())
    }

    /// Send a heartbeat if the session is open; otherwise do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Send`] if the write fails, after dropping the
    /// connection.
    pub async fn on_heartbeat_tick(&mut self) -> Result<(), SessionError> {
        self.send_frame(&Frame::heartbeat()).await
    }

    async fn on_open(&mut self, transport: C::Transport, room_id: u64) -> Result<(), SessionError> {
        self.link = Link::Open(transport);
        self.send_frame(&Frame::enter_room(room_id)).await?;
        info!(room_id, "session: open; enter-room sent");
        Ok(())
    }

    /// Decode one socket message and hand its batch to `sink`.
    ///
    /// Heartbeats keep firing while the sink is full. Returns `Ok(false)`
    /// once the receiving side is gone.
    async fn deliver(
        &mut self,
        bytes: &[u8],
        sink: &MessageSink,
        heartbeat: &mut Interval,
    ) -> Result<bool, SessionError> {
        let messages = match frames::decode_messages(bytes) {
            Ok(messages) => messages,
            Err(CodecError::DeprecatedProtocol) => {
                debug!(len = bytes.len(), "session: skipping int32 frame");
                return Ok(true);
            }
            Err(error) => {
                warn!(len = bytes.len(), error = %error, "session: dropping undecodable frame");
                return Ok(true);
            }
        };

        if messages.is_empty() {
            return Ok(true);
        }

        loop {
            tokio::select! {
                permit = sink.reserve() => {
                    let Ok(permit) = permit else {
                        return Ok(false);
                    };
                    debug!(count = messages.len(), "session: delivering batch");
                    permit.send(messages);
                    return Ok(true);
                }
                _ = heartbeat.tick() => {
                    debug!("session: sink full; heartbeat while waiting");
                    self.on_heartbeat_tick().await?;
                }
            }
        }
    }

    fn on_close(&mut self) {
        self.link = Link::Disconnected;
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<(), SessionError> {
        let Link::Open(transport) = &mut self.link else {
            debug!(operation = ?frame.operation, "session: not open; send skipped");
            return Ok(());
        };

        let result = transport.send(encode_frame(frame)).await;
        if let Err(error) = result {
            warn!(operation = ?frame.operation, error = %error, "session: send failed; closing");
            self.on_close();
            return Err(error);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
