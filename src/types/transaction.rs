//! Unified transaction view

use super::constants::statuses;
use super::value_to_optional_string;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A payment as seen by the SDK, regardless of gateway or originating call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Payment status, `pending` when the API did not report one
    pub status: String,
    /// Response of a payment initiation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiation_data: Option<Map<String, Value>>,
    /// Response of a payment status query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_data: Option<Map<String, Value>>,
    /// Callback payload; query responses share the callback shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<Map<String, Value>>,
}

impl Transaction {
    /// Build a transaction by detecting the shape of `data`.
    ///
    /// - `paymentReference` / `payment_reference` without `id`: initiation data
    /// - both `id` and `reference`: query data, mirrored into callback data
    /// - anything else: status only
    pub fn from_map(data: &Map<String, Value>) -> Self {
        let status = value_to_optional_string(data.get("status"))
            .unwrap_or_else(|| statuses::PENDING.to_string());

        let has_initiation_ref = (data.contains_key("paymentReference")
            || data.contains_key("payment_reference"))
            && !data.contains_key("id");
        let has_query_shape = data.contains_key("id") && data.contains_key("reference");

        if has_initiation_ref {
            return Self {
                status,
                initiation_data: Some(data.clone()),
                query_data: None,
                callback_data: None,
            };
        }

        if has_query_shape {
            return Self {
                status,
                initiation_data: None,
                query_data: Some(data.clone()),
                callback_data: Some(data.clone()),
            };
        }

        Self::with_status(status)
    }

    /// Build from any JSON value; non-objects are wrapped as `{"value": ...}`
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(&map),
            other => {
                let mut wrapped = Map::new();
                wrapped.insert("value".to_string(), other);
                Self::from_map(&wrapped)
            }
        }
    }

    /// A transaction with no variant data
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            initiation_data: None,
            query_data: None,
            callback_data: None,
        }
    }

    /// Payment reference from whichever data variant is populated
    pub fn payment_reference(&self) -> Option<String> {
        if let Some(data) = &self.initiation_data {
            return value_to_optional_string(
                data.get("paymentReference")
                    .or_else(|| data.get("payment_reference")),
            );
        }
        self.query_data
            .as_ref()
            .and_then(|data| value_to_optional_string(data.get("reference")))
    }

    pub fn is_successful(&self) -> bool {
        self.status == statuses::SUCCESS
    }

    pub fn is_pending(&self) -> bool {
        self.status == statuses::PENDING
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == statuses::CANCELLED
    }

    pub fn is_failed(&self) -> bool {
        self.status == statuses::FAILED
    }
}
