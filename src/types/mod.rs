//! Core types for the Tinker SDK
//!
//! This module holds the value types shared by the request pipeline and the
//! webhook verifier.
//!
//! # Architecture
//!
//! - [`constants`] - Endpoint paths, environment roots and status values
//! - [`meta`] - Envelope metadata recorded after each API call
//! - [`transaction`] - The unified view of a payment
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use tinker_payments::types::Transaction;
//!
//! let data = json!({"paymentReference": "P1", "status": "pending"});
//! let transaction = Transaction::from_map(data.as_object().unwrap());
//!
//! assert!(transaction.is_pending());
//! assert!(transaction.initiation_data.is_some());
//! ```

pub mod constants;
pub mod meta;
pub mod transaction;

// Re-export commonly used types
pub use constants::{endpoints, key_prefixes, statuses};
pub use meta::ResponseMeta;
pub use transaction::Transaction;

use serde_json::Value;

/// Render a JSON scalar as text. Strings are returned without quotes.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Render a JSON value as text, treating `null` as absent.
pub(crate) fn value_to_optional_string(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(value_to_string(v)),
    }
}
