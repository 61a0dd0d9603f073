//! Typed webhook events

use crate::types::{statuses, value_to_optional_string, value_to_string, Transaction};
use crate::{Result, TinkerError};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Event source for payment events
pub const SOURCE_PAYMENT: &str = "payment";
/// Event source for subscription events
pub const SOURCE_SUBSCRIPTION: &str = "subscription";
/// Event source for invoice events
pub const SOURCE_INVOICE: &str = "invoice";
/// Event source for settlement events
pub const SOURCE_SETTLEMENT: &str = "settlement";

/// Default signature algorithm name
pub const DEFAULT_ALGORITHM: &str = "HMAC-SHA256";

/// Signature block of a webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookSecurity {
    /// `sha256=<hex digest>`
    pub signature: String,
    /// Informational only; HMAC-SHA256 is always used for verification
    pub algorithm: String,
}

impl Default for WebhookSecurity {
    fn default() -> Self {
        Self {
            signature: String::new(),
            algorithm: DEFAULT_ALGORITHM.to_string(),
        }
    }
}

/// Decoded `meta` block of a webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMeta {
    pub version: String,
    pub app_id: String,
    pub gateway: Option<String>,
}

impl WebhookMeta {
    fn from_map(meta: &Map<String, Value>) -> Self {
        Self {
            version: text_or(meta, "version", "1.0"),
            app_id: text_or(meta, "app_id", ""),
            gateway: value_to_optional_string(meta.get("gateway")),
        }
    }
}

/// Data of a `payment` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentEventData {
    pub id: String,
    pub status: String,
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    pub channel: String,
    pub created_at: String,
    pub paid_at: Option<String>,
}

impl PaymentEventData {
    pub fn from_map(data: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            id: text_or(data, "id", ""),
            status: text_or(data, "status", statuses::PENDING),
            reference: text_or(data, "reference", ""),
            amount: number_or(data, "amount", 0.0)?,
            currency: text_or(data, "currency", ""),
            channel: text_or(data, "channel", ""),
            created_at: text_or(data, "created_at", ""),
            paid_at: value_to_optional_string(data.get("paid_at")),
        })
    }
}

/// Data of a `subscription` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionEventData {
    pub id: String,
    pub status: String,
    pub plan_id: String,
    pub account_id: String,
    pub current_period_start: Option<String>,
    pub current_period_end: Option<String>,
    pub created_at: String,
    pub cancelled_at: Option<String>,
    pub paused_at: Option<String>,
    pub reactivated_at: Option<String>,
}

impl SubscriptionEventData {
    pub fn from_map(data: &Map<String, Value>) -> Result<Self> {
        let current_period_start = value_to_optional_string(data.get("current_period_start"));
        let created_at = value_to_optional_string(data.get("created_at"))
            .filter(|s| !s.is_empty())
            .or_else(|| current_period_start.clone())
            .unwrap_or_default();

        Ok(Self {
            id: first_text(data, &["subscription_id", "id"]),
            status: text_or(data, "status", ""),
            plan_id: text_or(data, "plan_id", ""),
            account_id: first_text(data, &["account_id", "customer_id"]),
            current_period_start,
            current_period_end: value_to_optional_string(data.get("current_period_end")),
            created_at,
            cancelled_at: value_to_optional_string(data.get("cancelled_at")),
            paused_at: value_to_optional_string(data.get("paused_at")),
            reactivated_at: value_to_optional_string(data.get("reactivated_at")),
        })
    }
}

/// Data of an `invoice` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceEventData {
    pub id: String,
    pub status: String,
    pub invoice_number: String,
    pub amount: f64,
    pub currency: String,
    pub subscription_id: String,
    pub created_at: String,
    pub paid_at: Option<String>,
}

impl InvoiceEventData {
    pub fn from_map(data: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            id: first_text(data, &["invoice_id", "id"]),
            status: text_or(data, "status", ""),
            invoice_number: text_or(data, "invoice_number", ""),
            amount: number_or(data, "amount", 0.0)?,
            currency: text_or(data, "currency", ""),
            subscription_id: text_or(data, "subscription_id", ""),
            created_at: text_or(data, "created_at", ""),
            paid_at: value_to_optional_string(data.get("paid_at")),
        })
    }
}

/// Data of a `settlement` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementEventData {
    pub id: String,
    pub status: String,
    pub amount: f64,
    pub net_amount: Option<f64>,
    pub currency: String,
    pub settlement_date: String,
    pub created_at: String,
    pub processed_at: Option<String>,
}

impl SettlementEventData {
    pub fn from_map(data: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            id: first_text(data, &["settlement_id", "id"]),
            status: text_or(data, "status", ""),
            amount: number_or(data, "amount", 0.0)?,
            net_amount: optional_number(data, "net_amount")?,
            currency: text_or(data, "currency", ""),
            settlement_date: text_or(data, "settlement_date", ""),
            created_at: text_or(data, "created_at", ""),
            processed_at: value_to_optional_string(data.get("processed_at")),
        })
    }
}

/// Typed `data` of a webhook, selected by its `source`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    Payment(PaymentEventData),
    Subscription(SubscriptionEventData),
    Invoice(InvoiceEventData),
    Settlement(SettlementEventData),
}

impl EventData {
    /// Decode `data` with the decoder registered for `source`
    pub fn decode(source: &str, data: &Map<String, Value>) -> Result<Self> {
        match source {
            SOURCE_PAYMENT => PaymentEventData::from_map(data).map(EventData::Payment),
            SOURCE_SUBSCRIPTION => SubscriptionEventData::from_map(data).map(EventData::Subscription),
            SOURCE_INVOICE => InvoiceEventData::from_map(data).map(EventData::Invoice),
            SOURCE_SETTLEMENT => SettlementEventData::from_map(data).map(EventData::Settlement),
            other => Err(TinkerError::invalid_payload(format!(
                "Unknown webhook source: {}",
                other
            ))),
        }
    }

    /// The source this variant was decoded for
    pub fn source(&self) -> &'static str {
        match self {
            EventData::Payment(_) => SOURCE_PAYMENT,
            EventData::Subscription(_) => SOURCE_SUBSCRIPTION,
            EventData::Invoice(_) => SOURCE_INVOICE,
            EventData::Settlement(_) => SOURCE_SETTLEMENT,
        }
    }

    pub fn as_payment(&self) -> Option<&PaymentEventData> {
        match self {
            EventData::Payment(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_subscription(&self) -> Option<&SubscriptionEventData> {
        match self {
            EventData::Subscription(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_invoice(&self) -> Option<&InvoiceEventData> {
        match self {
            EventData::Invoice(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_settlement(&self) -> Option<&SettlementEventData> {
        match self {
            EventData::Settlement(data) => Some(data),
            _ => None,
        }
    }
}

/// Fields covered by the webhook signature, in signing order
#[derive(Debug, Serialize)]
pub(crate) struct CanonicalDocument<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub event_type: &'a str,
    pub source: &'a str,
    pub timestamp: &'a str,
    pub data: &'a Map<String, Value>,
    pub meta: &'a Map<String, Value>,
}

/// A decoded webhook notification.
///
/// `raw_data` and `raw_meta` hold the objects exactly as received; the
/// signature is computed over them, never over the typed projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    source: String,
    timestamp: String,
    data: EventData,
    meta: WebhookMeta,
    security: WebhookSecurity,
    raw_data: Map<String, Value>,
    raw_meta: Map<String, Value>,
}

impl WebhookEvent {
    /// Decode a webhook object. Non-object `data`/`meta`/`security` are
    /// treated as empty objects.
    pub fn from_map(payload: &Map<String, Value>) -> Result<Self> {
        let source = text_or(payload, "source", "");
        let raw_data = object_or_empty(payload.get("data"));
        let raw_meta = object_or_empty(payload.get("meta"));
        let security = object_or_empty(payload.get("security"));

        let data = EventData::decode(&source, &raw_data)?;

        Ok(Self {
            id: text_or(payload, "id", ""),
            event_type: text_or(payload, "type", ""),
            timestamp: text_or(payload, "timestamp", ""),
            source,
            data,
            meta: WebhookMeta::from_map(&raw_meta),
            security: WebhookSecurity {
                signature: text_or(&security, "signature", ""),
                algorithm: text_or(&security, "algorithm", DEFAULT_ALGORITHM),
            },
            raw_data,
            raw_meta,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn meta(&self) -> &WebhookMeta {
        &self.meta
    }

    pub fn security(&self) -> &WebhookSecurity {
        &self.security
    }

    /// `data` exactly as received
    pub fn raw_data(&self) -> &Map<String, Value> {
        &self.raw_data
    }

    /// `meta` exactly as received
    pub fn raw_meta(&self) -> &Map<String, Value> {
        &self.raw_meta
    }

    /// Copy of this event carrying `signature`; the signed fields are untouched
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.security.signature = signature.into();
        self
    }

    pub(crate) fn canonical_document(&self) -> CanonicalDocument<'_> {
        CanonicalDocument {
            id: &self.id,
            event_type: &self.event_type,
            source: &self.source,
            timestamp: &self.timestamp,
            data: &self.raw_data,
            meta: &self.raw_meta,
        }
    }

    /// Compact JSON of the signed fields: `id, type, source, timestamp, data, meta`
    pub fn canonical_json(&self) -> Result<String> {
        serde_json::to_string(&self.canonical_document()).map_err(|e| {
            TinkerError::invalid_payload(format!("Failed to serialize webhook: {}", e))
        })
    }

    /// Project a payment event into the unified transaction view.
    ///
    /// Returns `None` for every other source.
    pub fn to_transaction(&self) -> Option<Transaction> {
        let payment = self.data.as_payment()?;
        let projected = json!({
            "id": payment.id,
            "status": payment.status,
            "reference": payment.reference,
            "amount": payment.amount,
            "currency": payment.currency,
            "channel": payment.channel,
            "created_at": payment.created_at,
            "paid_at": payment.paid_at,
        });
        Some(Transaction::from_value(projected))
    }

    pub fn is_payment(&self) -> bool {
        self.source == SOURCE_PAYMENT
    }
}

fn object_or_empty(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

fn text_or(map: &Map<String, Value>, key: &str, default: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(value) => value_to_string(value),
    }
}

/// First present, non-null key wins
fn first_text(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| value_to_optional_string(map.get(*key)))
        .unwrap_or_default()
}

fn optional_number(map: &Map<String, Value>, key: &str) -> Result<Option<f64>> {
    let not_numeric = || {
        TinkerError::invalid_payload(format!("Field '{}' is not a number", key))
    };
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(not_numeric),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| not_numeric()),
        Some(_) => Err(not_numeric()),
    }
}

fn number_or(map: &Map<String, Value>, key: &str, default: f64) -> Result<f64> {
    Ok(optional_number(map, key)?.unwrap_or(default))
}
