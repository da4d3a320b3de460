//! JSON envelope codec for the node's RPC protocol.
//!
//! Requests are written as `{"id": n, "method": "...", "params": [request]}`;
//! replies are read as `{"id": n, "result": ..., "error": "..."}`. Only the
//! envelope fields are interpreted here. The request object is serialised as
//! given and the reply `result` is kept as raw JSON for the caller's decoder.

use std::collections::HashMap;

use serde::{
    Serialize,
    de::{self, Unexpected},
};
use serde_json::{Value, value::RawValue};

use crate::error::ProtocolError;

/// Raw bytes handed to a decoder when a reply carries no `result`.
pub const NULL_RESULT: &[u8] = b"null";

/// Outgoing call envelope.
///
/// `params` is a one-element array: the node's RPC dispatcher takes exactly
/// one argument object per method.
#[derive(Debug, Serialize)]
pub struct OutgoingEnvelope<'a, T: Serialize + ?Sized> {
    id: u64,
    method: &'a str,
    params: [&'a T; 1],
}

impl<'a, T: Serialize + ?Sized> OutgoingEnvelope<'a, T> {
    /// Build an envelope for `method` carrying `request`.
    #[must_use]
    pub fn new(id: u64, method: &'a str, request: &'a T) -> Self {
        Self {
            id,
            method,
            params: [request],
        }
    }

    /// Request id.
    #[must_use]
    pub const fn id(&self) -> u64 { self.id }

    /// Method name, e.g. `LitRPC.Balance`.
    #[must_use]
    pub const fn method(&self) -> &str { self.method }

    /// Serialise the envelope to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the request cannot be serialised.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> { serde_json::to_vec(self) }
}

/// Encode a call to `method` with id `id`.
///
/// # Errors
///
/// Returns the `serde_json` error if `request` cannot be serialised.
///
/// # Examples
///
/// ```
/// use litrpc::envelope::encode_request;
/// use serde_json::json;
///
/// let bytes = encode_request(1, "LitRPC.Balance", &json!({})).expect("encodes");
/// assert_eq!(bytes, br#"{"id":1,"method":"LitRPC.Balance","params":[{}]}"#);
/// ```
pub fn encode_request<T: Serialize + ?Sized>(
    id: u64,
    method: &str,
    request: &T,
) -> Result<Vec<u8>, serde_json::Error> {
    OutgoingEnvelope::new(id, method, request).to_vec()
}

/// Top-level fields of a reply, each left as undecoded JSON.
///
/// A map target only accepts a JSON object, so arrays and scalars are
/// rejected before any field is read.
type WireFields = HashMap<String, Box<RawValue>>;

/// Decoded reply envelope.
#[derive(Debug)]
pub struct IncomingEnvelope {
    id: u64,
    result: Option<Box<RawValue>>,
    error: Option<String>,
}

impl IncomingEnvelope {
    /// Id of the call this reply answers. Zero means unaddressed.
    #[must_use]
    pub const fn id(&self) -> u64 { self.id }

    /// Remote error text, if the node reported one.
    ///
    /// An absent, `null` or empty `error` field all mean success.
    #[must_use]
    pub fn error(&self) -> Option<&str> { self.error.as_deref().filter(|e| !e.is_empty()) }

    /// Raw JSON of the `result` field, or `null` when it was absent.
    #[must_use]
    pub fn result_bytes(&self) -> &[u8] {
        self.result
            .as_ref()
            .map_or(NULL_RESULT, |raw| raw.get().as_bytes())
    }

    /// Split the envelope into its id and outcome.
    #[must_use]
    pub fn into_outcome(self) -> (u64, ReplyOutcome) {
        let outcome = match self.error.filter(|e| !e.is_empty()) {
            Some(error) => ReplyOutcome::Error(error),
            None => ReplyOutcome::Result(
                self.result
                    .map_or_else(|| NULL_RESULT.to_vec(), |raw| raw.get().as_bytes().to_vec()),
            ),
        };
        (self.id, outcome)
    }
}

/// What a reply asks the correlator to do with its pending call.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Decode these raw result bytes.
    Result(Vec<u8>),
    /// Fail the call with this remote error text.
    Error(String),
}

/// Decode a reassembled message into a reply envelope.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are not UTF-8, not a JSON object
/// with the expected field types, or lack an `id`.
pub fn decode_reply(bytes: &[u8]) -> Result<IncomingEnvelope, ProtocolError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
    let mut fields: WireFields =
        serde_json::from_str(text).map_err(ProtocolError::MalformedEnvelope)?;
    let id = match fields.remove("id") {
        Some(raw) => serde_json::from_str::<Option<u64>>(raw.get())
            .map_err(ProtocolError::MalformedEnvelope)?,
        None => None,
    }
    .ok_or(ProtocolError::MissingId)?;
    let error = match fields.remove("error") {
        Some(raw) => error_text(&raw).map_err(ProtocolError::MalformedEnvelope)?,
        None => None,
    };
    let result = fields
        .remove("result")
        .filter(|raw| raw.get() != "null");
    Ok(IncomingEnvelope { id, result, error })
}

/// Read the `error` field. `null`, `""`, `[]` and `{}` all mean success.
fn error_text(raw: &RawValue) -> Result<Option<String>, serde_json::Error> {
    match serde_json::from_str::<Value>(raw.get())? {
        Value::Null => Ok(None),
        Value::String(text) if text.is_empty() => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Array(items) if items.is_empty() => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        other => Err(de::Error::invalid_type(
            unexpected(&other),
            &"a string, null or an empty container",
        )),
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
        Value::Null | Value::String(_) => Unexpected::Other("value"),
    }
}
