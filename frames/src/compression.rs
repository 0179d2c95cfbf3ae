//! Compression dispatch for frame bodies.
//!
//! Compressed bodies inflate into a complete frame, which may itself be
//! compressed. Unwrapping recurses until a plain-JSON frame is reached, up to
//! [`MAX_NESTING_DEPTH`] compressed layers.

use std::borrow::Cow;
use std::io::{self, Read};

use flate2::read::ZlibDecoder;

use crate::{CodecError, EMPTY_BODY_SENTINEL, Protocol, decode_frame};

/// Maximum number of compressed layers unwrapped for one frame.
pub const MAX_NESTING_DEPTH: usize = 8;

/// Maximum size of one inflated layer in bytes.
pub const MAX_INFLATED_LEN: usize = 16 * 1024 * 1024;

const EMPTY_OBJECT: &[u8] = b"{}";
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Resolve a frame body into JSON bytes.
///
/// Plain JSON is borrowed; the empty-body sentinel becomes `{}`. Compressed
/// bodies are inflated, decoded as an inner frame and resolved again.
///
/// # Errors
///
/// - [`CodecError::DeprecatedProtocol`] for the int32 tag.
/// - [`CodecError::UnknownProtocol`] for unrecognized tags.
/// - [`CodecError::Decompression`] when inflation fails or a layer inflates
///   past [`MAX_INFLATED_LEN`].
/// - [`CodecError::MalformedFrame`] when the inflated buffer is not a frame.
/// - [`CodecError::FrameTooDeep`] past [`MAX_NESTING_DEPTH`] layers.
pub fn resolve_body(protocol: Protocol, body: &[u8]) -> Result<Cow<'_, [u8]>, CodecError> {
    resolve_at_depth(protocol, body, 0)
}

fn resolve_at_depth(protocol: Protocol, body: &[u8], depth: usize) -> Result<Cow<'_, [u8]>, CodecError> {
    match protocol {
        Protocol::Json if body == EMPTY_BODY_SENTINEL.as_slice() => Ok(Cow::Borrowed(EMPTY_OBJECT)),
        Protocol::Json => Ok(Cow::Borrowed(body)),
        Protocol::Zlib | Protocol::Brotli => {
            if depth >= MAX_NESTING_DEPTH {
                return Err(CodecError::FrameTooDeep { limit: MAX_NESTING_DEPTH });
            }

            let inflated = if protocol == Protocol::Zlib {
                inflate_zlib(body)?
            } else {
                inflate_brotli(body)?
            };
            let inner = decode_frame(&inflated)?;
            let resolved = resolve_at_depth(inner.header.protocol, inner.body, depth + 1)?;
            Ok(Cow::Owned(resolved.into_owned()))
        }
        Protocol::LegacyInt32 => Err(CodecError::DeprecatedProtocol),
        Protocol::Other(tag) => Err(CodecError::UnknownProtocol(tag)),
    }
}

fn inflate_zlib(body: &[u8]) -> Result<Vec<u8>, CodecError> {
    read_capped(ZlibDecoder::new(body), "zlib")
}

fn inflate_brotli(body: &[u8]) -> Result<Vec<u8>, CodecError> {
    read_capped(brotli::Decompressor::new(body, BROTLI_BUFFER_SIZE), "brotli")
}

fn read_capped(reader: impl Read, algorithm: &'static str) -> Result<Vec<u8>, CodecError> {
    let limit = u64::try_from(MAX_INFLATED_LEN).unwrap_or(u64::MAX).saturating_add(1);
    let mut out = Vec::new();
    reader
        .take(limit)
        .read_to_end(&mut out)
        .map_err(|source| CodecError::Decompression { algorithm, source })?;

    if out.len() > MAX_INFLATED_LEN {
        return Err(CodecError::Decompression {
            algorithm,
            source: io::Error::new(io::ErrorKind::InvalidData, "inflated body exceeds size cap"),
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "compression_test.rs"]
mod tests;
