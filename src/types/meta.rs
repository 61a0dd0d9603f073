//! Envelope metadata

use super::value_to_optional_string;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata carried by the `meta` field of a response envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Server-assigned request identifier
    pub request_id: Option<String>,
    /// Server timestamp of the response
    pub timestamp: Option<String>,
    /// `sandbox` or `production`
    pub environment: Option<String>,
}

impl ResponseMeta {
    /// Build from an envelope `meta` object. Absent or null keys become `None`.
    pub fn from_map(meta: &Map<String, Value>) -> Self {
        Self {
            request_id: value_to_optional_string(meta.get("request_id")),
            timestamp: value_to_optional_string(meta.get("timestamp")),
            environment: value_to_optional_string(meta.get("environment")),
        }
    }

    /// Build from any JSON value; non-objects yield empty metadata
    pub fn from_value(meta: Option<&Value>) -> Self {
        match meta {
            Some(Value::Object(map)) => Self::from_map(map),
            _ => Self::default(),
        }
    }
}
