//! Splitting of batched JSON bodies.
//!
//! A resolved body can hold several JSON documents separated by runs of
//! control bytes (0x00-0x1F), usually left over from the headers of inner
//! frames. Fragments that do not parse as JSON are dropped, not reported.

use serde::de::IgnoredAny;

/// Split `bytes` on control-byte runs and keep the fragments that parse as
/// JSON, in input order.
#[must_use]
pub fn split_bodies(bytes: &[u8]) -> Vec<&[u8]> {
    bytes
        .split(|byte| is_separator(*byte))
        .filter(|fragment| !fragment.is_empty() && is_json(fragment))
        .collect()
}

fn is_separator(byte: u8) -> bool {
    byte <= 0x1f
}

fn is_json(fragment: &[u8]) -> bool {
    serde_json::from_slice::<IgnoredAny>(fragment).is_ok()
}

#[cfg(test)]
#[path = "split_test.rs"]
mod tests;
