//! Correlation envelope.
//!
//! Every outbound call is wrapped in the backend's RPC envelope:
//!
//! ```text
//! {
//!   "id": "<device-id>::<path>",
//!   "method": "mutation",
//!   "params": {
//!     "path": "<path>",
//!     "input": { "json": { ...payload } }
//!   }
//! }
//! ```
//!
//! Replies echo `id` verbatim; splitting it on `::` recovers the
//! originating path, which drives inbound dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Delimiter between device id and path in a correlation id.
pub const ID_DELIMITER: &str = "::";

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    id: String,
    method: &'a str,
    params: Params<'a>,
}

#[derive(Debug, Serialize)]
struct Params<'a> {
    path: &'a str,
    input: Input,
}

#[derive(Debug, Serialize)]
struct Input {
    json: Value,
}

/// Build the correlation id for a call.
pub fn correlation_id(device_id: &str, path: &str) -> String {
    format!("{device_id}{ID_DELIMITER}{path}")
}

/// Wrap a payload into the wire envelope and serialize it.
pub fn encode(device_id: &str, method: &str, path: &str, payload: Value) -> String {
    let envelope = Envelope {
        id: correlation_id(device_id, path),
        method,
        params: Params {
            path,
            input: Input { json: payload },
        },
    };
    // The envelope is built from serializable parts only; this cannot fail.
    serde_json::to_string(&envelope).unwrap_or_default()
}

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

/// A reply as echoed by the backend.
#[derive(Debug, Deserialize)]
pub struct Reply {
    /// Echoed correlation id.
    pub id: Option<String>,
    /// Server-side error object; its presence drops the message.
    pub error: Option<Value>,
    /// Call result, when the reply carries data.
    pub result: Option<ReplyResult>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyResult {
    pub data: Option<ReplyData>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyData {
    pub json: Option<Value>,
}

impl Reply {
    /// The payload at `result.data.json`, if present.
    pub fn payload(&self) -> Option<&Value> {
        self.result.as_ref()?.data.as_ref()?.json.as_ref()
    }
}

/// Parse an inbound text frame as a reply.
pub fn parse_reply(text: &str) -> Result<Reply, ProtocolError> {
    serde_json::from_str(text).map_err(|_| ProtocolError::MalformedMessage)
}

/// Split an echoed correlation id into `(device_id, path)`.
///
/// Both tokens must be non-empty.
pub fn split_id(id: &str) -> Result<(&str, &str), ProtocolError> {
    let (device, path) = id
        .split_once(ID_DELIMITER)
        .ok_or(ProtocolError::BadCorrelationId)?;
    if device.is_empty() || path.is_empty() {
        return Err(ProtocolError::BadCorrelationId);
    }
    Ok((device, path))
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
