//! Response envelope decoding
//!
//! Every non-webhook response is wrapped as
//! `{"success": bool, "data": ..., "meta": {...}, "error": {...}}`.
//! [`unwrap_envelope`] applies the unwrapping rules as a pure function;
//! [`EnvelopeDecoder`] additionally remembers the last metadata it saw.

use crate::types::ResponseMeta;
use crate::{Result, TinkerError};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

/// Fallback message when a failure response carries none
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Outcome of unwrapping a successful response
#[derive(Debug, Clone, PartialEq)]
pub struct Unwrapped {
    /// The payload: an object or an array
    pub data: Value,
    /// Envelope metadata, present only when the body was an envelope
    pub meta: Option<ResponseMeta>,
}

/// Extract the error message from a failure body.
///
/// Precedence: `error.message`, `error.code`, top-level `message`, then
/// [`UNKNOWN_ERROR`]. Top-level `message` is only consulted when `error` is
/// not an object.
pub fn extract_error_message(body: &Value) -> String {
    let Some(map) = body.as_object() else {
        return UNKNOWN_ERROR.to_string();
    };

    if let Some(Value::Object(error)) = map.get("error") {
        return [error.get("message"), error.get("code")]
            .into_iter()
            .flatten()
            .find(|value| is_truthy(value))
            .map(crate::types::value_to_string)
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
    }

    match map.get("message") {
        Some(message) => crate::types::value_to_string(message),
        None => UNKNOWN_ERROR.to_string(),
    }
}

/// Apply the envelope rules to a decoded body.
///
/// 1. `status >= 400` fails with an API error.
/// 2. An object with a `success` key is an envelope: `success: false` fails,
///    otherwise `data` is returned (scalars wrapped as `{"value": data}`).
/// 3. Any other object or array is returned unchanged; scalars become `{}`.
pub fn unwrap_envelope(body: &Value, status: u16) -> Result<Unwrapped> {
    if status >= 400 {
        return Err(TinkerError::api(extract_error_message(body)));
    }

    if let Some(map) = body.as_object() {
        if map.contains_key("success") {
            let meta = ResponseMeta::from_value(map.get("meta"));

            if map.get("success") == Some(&Value::Bool(false)) {
                return Err(TinkerError::api(extract_error_message(body)));
            }

            let data = match map.get("data") {
                Some(data @ (Value::Object(_) | Value::Array(_))) => data.clone(),
                other => {
                    let mut wrapped = Map::new();
                    wrapped.insert("value".to_string(), other.cloned().unwrap_or(Value::Null));
                    Value::Object(wrapped)
                }
            };

            return Ok(Unwrapped {
                data,
                meta: Some(meta),
            });
        }
    }

    let data = match body {
        Value::Object(_) | Value::Array(_) => body.clone(),
        _ => Value::Object(Map::new()),
    };
    Ok(Unwrapped { data, meta: None })
}

/// Envelope decoder that records the metadata of the last envelope decoded
#[derive(Debug, Default)]
pub struct EnvelopeDecoder {
    last_meta: RwLock<Option<ResponseMeta>>,
}

impl EnvelopeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a body, recording its metadata when it is an envelope.
    ///
    /// Metadata is recorded even when the envelope reports `success: false`.
    pub async fn decode(&self, body: &Value, status: u16) -> Result<Value> {
        if status < 400 {
            if let Some(map) = body.as_object().filter(|map| map.contains_key("success")) {
                *self.last_meta.write().await = Some(ResponseMeta::from_value(map.get("meta")));
            }
        }

        unwrap_envelope(body, status).map(|unwrapped| unwrapped.data)
    }

    /// Metadata of the most recent envelope, if any
    pub async fn last_meta(&self) -> Option<ResponseMeta> {
        self.last_meta.read().await.clone()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
