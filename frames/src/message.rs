use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Operation;

/// One JSON payload recovered from an inbound frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedMessage {
    /// Operation of the outer frame that carried this payload.
    pub operation: Operation,
    /// Sequence id of the outer frame.
    pub sequence_id: u32,
    /// Raw JSON text of the payload, already validated.
    pub body: String,
}

impl DecodedMessage {
    /// Build from a fragment that already parsed as JSON. Valid JSON is
    /// always UTF-8, so `None` only guards the conversion.
    pub(crate) fn from_fragment(operation: Operation, sequence_id: u32, fragment: &[u8]) -> Option<Self> {
        let body = String::from_utf8(fragment.to_vec()).ok()?;
        Some(Self { operation, sequence_id, body })
    }

    /// Parse the payload into a JSON value.
    ///
    /// # Errors
    ///
    /// Never fails for messages produced by [`crate::decode_messages`]; a
    /// hand-built message with an invalid body returns the parse error.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}
