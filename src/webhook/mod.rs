//! Webhook decoding and signature verification
//!
//! Webhooks are delivered out-of-band as JSON objects:
//!
//! ```json
//! {
//!   "id": "evt_123",
//!   "type": "payment.completed",
//!   "source": "payment",
//!   "timestamp": "2026-02-11T22:52:45Z",
//!   "data": {"id": "pay_1", "status": "success", "reference": "REF1"},
//!   "meta": {"app_id": "app_123", "version": "1.0"},
//!   "security": {"algorithm": "HMAC-SHA256", "signature": "sha256=..."}
//! }
//! ```
//!
//! The signature is `sha256=` followed by the hex HMAC-SHA256, keyed with the
//! webhook secret, of the compact JSON document
//! `{"id","type","source","timestamp","data","meta"}` in exactly that order,
//! with `data` and `meta` as originally received.
//!
//! # Examples
//!
//! ```no_run
//! use tinker_payments::webhook::WebhookHandler;
//!
//! # fn example(body: &str) -> tinker_payments::Result<()> {
//! let handler = WebhookHandler::new();
//!
//! if !handler.verify_payload(body, "whsec_123")? {
//!     return Ok(()); // reject the delivery
//! }
//!
//! let event = handler.handle(body)?;
//! if let Some(transaction) = event.to_transaction() {
//!     println!("Payment {} is {}", event.id(), transaction.status);
//! }
//! # Ok(())
//! # }
//! ```

use crate::types::Transaction;
use crate::{Result, TinkerError};
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub mod events;


pub use events::{
    EventData, InvoiceEventData, PaymentEventData, SettlementEventData, SubscriptionEventData,
    WebhookEvent, WebhookMeta, WebhookSecurity,
};

/// Prefix of every webhook signature
pub const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

/// Raw webhook input: a request body or an already parsed document
#[derive(Debug, Clone, Copy)]
pub enum WebhookPayload<'a> {
    Text(&'a str),
    Json(&'a Value),
    Object(&'a Map<String, Value>),
}

impl<'a> From<&'a str> for WebhookPayload<'a> {
    fn from(text: &'a str) -> Self {
        WebhookPayload::Text(text)
    }
}

impl<'a> From<&'a String> for WebhookPayload<'a> {
    fn from(text: &'a String) -> Self {
        WebhookPayload::Text(text.as_str())
    }
}

impl<'a> From<&'a Value> for WebhookPayload<'a> {
    fn from(value: &'a Value) -> Self {
        WebhookPayload::Json(value)
    }
}

impl<'a> From<&'a Map<String, Value>> for WebhookPayload<'a> {
    fn from(map: &'a Map<String, Value>) -> Self {
        WebhookPayload::Object(map)
    }
}

/// Decode a webhook into a typed event
pub fn decode<'a>(payload: impl Into<WebhookPayload<'a>>) -> Result<WebhookEvent> {
    match payload.into() {
        WebhookPayload::Text(text) => {
            let value: Value = serde_json::from_str(text).map_err(|e| {
                TinkerError::invalid_payload(format!("Invalid JSON payload: {}", e))
            })?;
            decode_value(&value)
        }
        WebhookPayload::Json(value) => decode_value(value),
        WebhookPayload::Object(map) => WebhookEvent::from_map(map),
    }
}

fn decode_value(value: &Value) -> Result<WebhookEvent> {
    match value {
        Value::Object(map) => WebhookEvent::from_map(map),
        _ => Err(TinkerError::invalid_payload(
            "Webhook payload must be an object",
        )),
    }
}

/// `sha256=<hex>` HMAC-SHA256 of `canonical_json` keyed with `secret`
pub fn compute_signature(canonical_json: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| TinkerError::config(format!("Invalid webhook secret: {}", e)))?;
    mac.update(canonical_json.as_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest)))
}

/// Signature the sender would attach to `event`
pub fn sign(event: &WebhookEvent, secret: &str) -> Result<String> {
    compute_signature(&event.canonical_json()?, secret)
}

/// Check the signature carried by a decoded event.
///
/// An empty secret or a signature without the `sha256=` prefix never verifies.
pub fn verify_signature(event: &WebhookEvent, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let signature = &event.security().signature;
    if !signature.starts_with(SIGNATURE_PREFIX) {
        tracing::debug!(event_id = %event.id(), "Webhook signature missing sha256= prefix");
        return false;
    }

    let expected = match sign(event, secret) {
        Ok(expected) => expected,
        Err(e) => {
            tracing::warn!(event_id = %event.id(), error = %e, "Failed to compute webhook signature");
            return false;
        }
    };

    bool::from(signature.as_bytes().ct_eq(expected.as_bytes()))
}

/// Decode a raw payload and check its signature.
///
/// Decode failures are returned as errors; a mismatch is `Ok(false)`.
pub fn verify_payload<'a>(payload: impl Into<WebhookPayload<'a>>, secret: &str) -> Result<bool> {
    if secret.is_empty() {
        return Ok(false);
    }
    let event = decode(payload)?;
    Ok(verify_signature(&event, secret))
}

/// Stateless entry point for webhook handling
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookHandler;

impl WebhookHandler {
    pub fn new() -> Self {
        Self
    }

    /// Decode a webhook, see [`decode`]
    pub fn handle<'a>(&self, payload: impl Into<WebhookPayload<'a>>) -> Result<WebhookEvent> {
        decode(payload)
    }

    /// Decode a webhook and project payment events into a [`Transaction`]
    pub fn handle_as_transaction<'a>(
        &self,
        payload: impl Into<WebhookPayload<'a>>,
    ) -> Result<Option<Transaction>> {
        Ok(decode(payload)?.to_transaction())
    }

    /// See [`verify_signature`]
    pub fn verify_signature(&self, event: &WebhookEvent, secret: &str) -> bool {
        verify_signature(event, secret)
    }

    /// See [`verify_payload`]
    pub fn verify_payload<'a>(
        &self,
        payload: impl Into<WebhookPayload<'a>>,
        secret: &str,
    ) -> Result<bool> {
        verify_payload(payload, secret)
    }
}
