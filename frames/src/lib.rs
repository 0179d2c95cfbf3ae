//! Frame model and binary codec for the live-chat broadcast transport.
//!
//! Every message on the socket is a 16-byte big-endian header followed by a
//! body. The body is plain JSON, a retired int32 encoding, or a zlib/brotli
//! buffer that inflates into another complete frame. This crate owns the
//! header layout ([`encode_frame`] / [`decode_frame`]), the compression
//! unwrapping ([`resolve_body`]) and the splitting of batched JSON bodies
//! ([`split_bodies`]). [`decode_messages`] chains the three.

mod compression;
mod message;
mod split;

pub use compression::{MAX_INFLATED_LEN, MAX_NESTING_DEPTH, resolve_body};
pub use message::DecodedMessage;
pub use split::split_bodies;

use serde::{Deserialize, Serialize};

/// Fixed size of the frame header in bytes.
pub const HEADER_LEN: usize = 16;

/// Header length as written on the wire.
const HEADER_LEN_WIRE: u16 = 16;

/// Plain-JSON body that stands for an empty object.
pub const EMPTY_BODY_SENTINEL: [u8; 4] = [0, 0, 0, 1];

/// Sequence id stamped on every client-sent frame.
pub const CLIENT_SEQUENCE_ID: u32 = 1;

/// Error returned while decoding or unwrapping a frame.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Fewer bytes than a header were received.
    #[error("malformed frame: {len} bytes is shorter than the 16-byte header")]
    MalformedFrame { len: usize },
    /// The protocol tag is not one this client understands.
    #[error("unknown protocol tag: {0}")]
    UnknownProtocol(u16),
    /// The int32 big-endian protocol was retired upstream.
    #[error("deprecated int32 protocol has no body decoding")]
    DeprecatedProtocol,
    /// A compressed body could not be inflated.
    #[error("{algorithm} decompression failed: {source}")]
    Decompression {
        algorithm: &'static str,
        #[source]
        source: std::io::Error,
    },
    /// Compressed frames nested deeper than [`MAX_NESTING_DEPTH`].
    #[error("compressed frames nested deeper than {limit} levels")]
    FrameTooDeep { limit: usize },
}

/// How a frame body is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum Protocol {
    /// UTF-8 JSON, possibly several documents.
    Json,
    /// Retired int32 big-endian encoding.
    LegacyInt32,
    /// zlib buffer holding a complete inner frame.
    Zlib,
    /// brotli buffer holding a complete inner frame.
    Brotli,
    /// Any tag outside the known set.
    Other(u16),
}

impl Protocol {
    /// Convert into the wire tag.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Json => 0,
            Self::LegacyInt32 => 1,
            Self::Zlib => 2,
            Self::Brotli => 3,
            Self::Other(tag) => tag,
        }
    }

    /// Parse a wire tag. Unknown tags are preserved, not rejected.
    #[must_use]
    pub fn from_u16(tag: u16) -> Self {
        match tag {
            0 => Self::Json,
            1 => Self::LegacyInt32,
            2 => Self::Zlib,
            3 => Self::Brotli,
            other => Self::Other(other),
        }
    }
}

impl From<u16> for Protocol {
    fn from(tag: u16) -> Self {
        Self::from_u16(tag)
    }
}

impl From<Protocol> for u16 {
    fn from(protocol: Protocol) -> Self {
        protocol.as_u16()
    }
}

/// What a frame is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum Operation {
    /// Client keepalive.
    Heartbeat,
    /// Server reply to a keepalive.
    HeartbeatAck,
    /// Broadcast notification (chat, gifts, system notices).
    Notify,
    /// Client handshake joining a room.
    EnterRoom,
    /// Server reply to the handshake.
    EnterRoomAck,
    /// Passed through uninterpreted.
    Other(u32),
}

impl Operation {
    /// Convert into the wire value.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Heartbeat => 2,
            Self::HeartbeatAck => 3,
            Self::Notify => 5,
            Self::EnterRoom => 7,
            Self::EnterRoomAck => 8,
            Self::Other(value) => value,
        }
    }

    /// Parse a wire value.
    #[must_use]
    pub fn from_u32(value: u32) -> Self {
        match value {
            2 => Self::Heartbeat,
            3 => Self::HeartbeatAck,
            5 => Self::Notify,
            7 => Self::EnterRoom,
            8 => Self::EnterRoomAck,
            other => Self::Other(other),
        }
    }
}

impl From<u32> for Operation {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl From<Operation> for u32 {
    fn from(operation: Operation) -> Self {
        operation.as_u32()
    }
}

/// The five header fields, as laid out on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// Header plus body length in bytes.
    pub total_len: u32,
    /// Always [`HEADER_LEN`] in this protocol version.
    pub header_len: u16,
    pub protocol: Protocol,
    pub operation: Operation,
    pub sequence_id: u32,
}

/// A decoded header borrowing its body from the input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawFrame<'a> {
    pub header: Header,
    /// Every byte after the header. `total_len` is not used to truncate.
    pub body: &'a [u8],
}

/// A logical frame ready to be encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub protocol: Protocol,
    pub operation: Operation,
    pub sequence_id: u32,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct EnterRoomBody {
    roomid: u64,
}

impl Frame {
    /// Handshake joining `room_id`, body `{"roomid":<room_id>}`.
    #[must_use]
    pub fn enter_room(room_id: u64) -> Self {
        // Serializing a single integer field cannot fail.
        let body = serde_json::to_vec(&EnterRoomBody { roomid: room_id }).unwrap_or_default();
        Self {
            protocol: Protocol::Json,
            operation: Operation::EnterRoom,
            sequence_id: CLIENT_SEQUENCE_ID,
            body,
        }
    }

    /// Keepalive with an empty JSON object body.
    #[must_use]
    pub fn heartbeat() -> Self {
        Self {
            protocol: Protocol::Json,
            operation: Operation::Heartbeat,
            sequence_id: CLIENT_SEQUENCE_ID,
            body: b"{}".to_vec(),
        }
    }

    /// Header this frame encodes to.
    ///
    /// Bodies longer than `u32::MAX - 16` bytes saturate `total_len`; the
    /// server caps frames far below that.
    #[must_use]
    pub fn header(&self) -> Header {
        let total_len = u32::try_from(HEADER_LEN + self.body.len()).unwrap_or(u32::MAX);
        Header {
            total_len,
            header_len: HEADER_LEN_WIRE,
            protocol: self.protocol,
            operation: self.operation,
            sequence_id: self.sequence_id,
        }
    }
}

/// Encode a frame into its wire bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let header = frame.header();

    let mut out = Vec::with_capacity(HEADER_LEN + frame.body.len());
    out.extend_from_slice(&header.total_len.to_be_bytes());
    out.extend_from_slice(&header.header_len.to_be_bytes());
    out.extend_from_slice(&header.protocol.as_u16().to_be_bytes());
    out.extend_from_slice(&header.operation.as_u32().to_be_bytes());
    out.extend_from_slice(&header.sequence_id.to_be_bytes());
    out.extend_from_slice(&frame.body);
    out
}

/// Decode a header and borrow the remaining bytes as the body.
///
/// # Errors
///
/// Returns [`CodecError::MalformedFrame`] when `bytes` is shorter than the
/// header.
pub fn decode_frame(bytes: &[u8]) -> Result<RawFrame<'_>, CodecError> {
    let Some((head, body)) = bytes.split_first_chunk::<HEADER_LEN>() else {
        return Err(CodecError::MalformedFrame { len: bytes.len() });
    };

    let header = Header {
        total_len: u32::from_be_bytes([head[0], head[1], head[2], head[3]]),
        header_len: u16::from_be_bytes([head[4], head[5]]),
        protocol: Protocol::from_u16(u16::from_be_bytes([head[6], head[7]])),
        operation: Operation::from_u32(u32::from_be_bytes([head[8], head[9], head[10], head[11]])),
        sequence_id: u32::from_be_bytes([head[12], head[13], head[14], head[15]]),
    };

    Ok(RawFrame { header, body })
}

/// Decode one socket message into its application messages.
///
/// Runs [`decode_frame`], [`resolve_body`] and [`split_bodies`] in order and
/// stamps every surviving fragment with the outer frame's operation and
/// sequence id. An empty result is not an error.
///
/// # Errors
///
/// Propagates codec and decompression failures; the whole message is dropped
/// and nothing partial is returned.
pub fn decode_messages(bytes: &[u8]) -> Result<Vec<DecodedMessage>, CodecError> {
    let frame = decode_frame(bytes)?;
    let body = resolve_body(frame.header.protocol, frame.body)?;

    Ok(split_bodies(&body)
        .into_iter()
        .filter_map(|fragment| {
            DecodedMessage::from_fragment(frame.header.operation, frame.header.sequence_id, fragment)
        })
        .collect())
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
