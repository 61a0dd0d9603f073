//! Gateway-stamped request bodies
//!
//! Every gateway takes the same payment endpoints; only the body differs. A
//! request is built by serializing the caller's payload, letting a shaping
//! function adjust it, and stamping the gateway name.

use crate::{Result, TinkerError};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Payment gateway routed by the API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Gateway {
    Mpesa,
    Paystack,
    Stripe,
    /// A gateway this SDK version does not name
    Other(String),
}

impl Gateway {
    /// Wire name of the gateway
    pub fn as_str(&self) -> &str {
        match self {
            Gateway::Mpesa => "mpesa",
            Gateway::Paystack => "paystack",
            Gateway::Stripe => "stripe",
            Gateway::Other(name) => name.as_str(),
        }
    }
}

impl std::fmt::Display for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gateway {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "mpesa" => Gateway::Mpesa,
            "paystack" => Gateway::Paystack,
            "stripe" => Gateway::Stripe,
            _ => Gateway::Other(s.to_string()),
        })
    }
}

/// Serialize `payload`, apply `shape`, then set `gateway` to the gateway name.
///
/// The payload must serialize to a JSON object.
pub fn gateway_request<T, F>(gateway: &Gateway, payload: &T, shape: F) -> Result<Value>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut Map<String, Value>),
{
    let value = serde_json::to_value(payload).map_err(|e| {
        TinkerError::invalid_payload(format!("Failed to serialize request payload: {}", e))
    })?;

    let Value::Object(mut body) = value else {
        return Err(TinkerError::invalid_payload(
            "Request payload must serialize to a JSON object",
        ));
    };

    shape(&mut body);
    body.insert("gateway".to_string(), Value::String(gateway.as_str().to_string()));
    Ok(Value::Object(body))
}

/// Body for a payment initiation: the payload plus the gateway name
pub fn initiation_payload<T: Serialize + ?Sized>(gateway: &Gateway, payload: &T) -> Result<Value> {
    gateway_request(gateway, payload, |_| {})
}

/// Body for a status query by payment reference
pub fn query_payload(gateway: &Gateway, payment_reference: &str) -> Result<Value> {
    gateway_request(
        gateway,
        &json!({ "payment_reference": payment_reference }),
        |_| {},
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct MpesaRequest {
        amount: f64,
        currency: String,
        customer_phone: String,
    }

    #[test]
    fn test_gateway_names() {
        assert_eq!(Gateway::Mpesa.as_str(), "mpesa");
        assert_eq!(Gateway::Stripe.to_string(), "stripe");
        assert_eq!("Paystack".parse::<Gateway>().unwrap(), Gateway::Paystack);
        assert_eq!(
            "adyen".parse::<Gateway>().unwrap(),
            Gateway::Other("adyen".to_string())
        );
    }

    #[test]
    fn test_initiation_payload_stamps_gateway() {
        let request = MpesaRequest {
            amount: 100.0,
            currency: "KES".to_string(),
            customer_phone: "254700000000".to_string(),
        };
        let body = initiation_payload(&Gateway::Mpesa, &request).unwrap();
        assert_eq!(
            body,
            json!({
                "amount": 100.0,
                "currency": "KES",
                "customerPhone": "254700000000",
                "gateway": "mpesa"
            })
        );
    }

    #[test]
    fn test_gateway_overrides_caller_value() {
        let body = initiation_payload(&Gateway::Stripe, &json!({"gateway": "other"})).unwrap();
        assert_eq!(body["gateway"], "stripe");
    }

    #[test]
    fn test_query_payload() {
        let body = query_payload(&Gateway::Paystack, "PAY-1").unwrap();
        assert_eq!(
            body,
            json!({"payment_reference": "PAY-1", "gateway": "paystack"})
        );
    }

    #[test]
    fn test_shape_function_runs_before_stamp() {
        let body = gateway_request(&Gateway::Stripe, &json!({"currency": "USD"}), |body| {
            if let Some(Value::String(currency)) = body.get_mut("currency") {
                *currency = currency.to_lowercase();
            }
        })
        .unwrap();
        assert_eq!(body, json!({"currency": "usd", "gateway": "stripe"}));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let err = initiation_payload(&Gateway::Mpesa, &vec![1, 2]).unwrap_err();
        assert!(err.is_invalid_payload());
    }
}
