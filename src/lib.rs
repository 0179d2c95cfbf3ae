//! Client session for the live-chat broadcast socket.
//!
//! DESIGN
//! ======
//! The wire format lives in the `frames` crate. This crate drives one
//! persistent connection: handshake on open, a fixed 30-second keepalive,
//! and decoding of every inbound frame into batches of
//! [`DecodedMessage`] delivered over a bounded channel.
//!
//! Room ids shown to viewers are resolved to internal ids by [`RoomLookup`]
//! before a session starts.

pub mod config;
pub mod room;
pub mod session;
pub mod transport;

pub use config::SessionConfig;
pub use frames::{CodecError, DecodedMessage, Operation, Protocol};
pub use room::{LookupError, RoomInfo, RoomLookup};
pub use session::{HEARTBEAT_INTERVAL, MessageSink, SessionClient, SessionError, SessionState};
pub use transport::{Connector, Transport, TransportEvent, WsConnector, WsTransport};
