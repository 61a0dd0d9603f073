//! Subscription plans and subscriptions

use super::RequestExecutor;
use crate::types::{endpoints, ResponseMeta};
use crate::Result;
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

/// Characters escaped in query-string values
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Typed operations over the subscription endpoints
#[derive(Debug)]
pub struct SubscriptionManager {
    executor: RequestExecutor,
}

impl SubscriptionManager {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// Create a subscription plan
    pub async fn create_plan(&self, payload: Value) -> Result<Map<String, Value>> {
        let response = self
            .executor
            .request(Method::POST, endpoints::SUBSCRIPTION_PLANS_PATH, Some(payload))
            .await?;
        Ok(into_map(response))
    }

    /// List subscription plans
    pub async fn list_plans(&self) -> Result<Vec<Value>> {
        let response = self
            .executor
            .request(Method::GET, endpoints::SUBSCRIPTION_PLANS_PATH, None)
            .await?;
        Ok(into_list(response))
    }

    /// Subscribe a customer to a plan
    pub async fn create(&self, payload: Value) -> Result<Map<String, Value>> {
        let response = self
            .executor
            .request(Method::POST, endpoints::SUBSCRIPTION_BASE_PATH, Some(payload))
            .await?;
        Ok(into_map(response))
    }

    /// List subscriptions, optionally filtered by plan and customer.
    ///
    /// Blank filters are ignored.
    pub async fn list(
        &self,
        plan_id: Option<&str>,
        external_customer_id: Option<&str>,
    ) -> Result<Vec<Value>> {
        let path = list_path(plan_id, external_customer_id);
        let response = self.executor.request(Method::GET, &path, None).await?;
        Ok(into_list(response))
    }

    /// Cancel a subscription
    pub async fn cancel(&self, subscription_id: &str) -> Result<Map<String, Value>> {
        let path = endpoints::subscription_cancel_path(
            &utf8_percent_encode(subscription_id, QUERY_VALUE).to_string(),
        );
        let response = self.executor.request(Method::POST, &path, None).await?;
        Ok(into_map(response))
    }

    /// Metadata from the last subscription call
    pub async fn last_meta(&self) -> Option<ResponseMeta> {
        self.executor.last_meta().await
    }
}

fn list_path(plan_id: Option<&str>, external_customer_id: Option<&str>) -> String {
    let params: Vec<String> = [("plan_id", plan_id), ("external_customer_id", external_customer_id)]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{}={}", key, utf8_percent_encode(v, QUERY_VALUE)))
        })
        .collect();

    if params.is_empty() {
        endpoints::SUBSCRIPTION_BASE_PATH.to_string()
    } else {
        format!("{}?{}", endpoints::SUBSCRIPTION_BASE_PATH, params.join("&"))
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_path_without_filters() {
        assert_eq!(list_path(None, None), "subscriptions");
        assert_eq!(list_path(Some("  "), Some("")), "subscriptions");
    }

    #[test]
    fn test_list_path_with_filters() {
        assert_eq!(
            list_path(Some("plan_1"), None),
            "subscriptions?plan_id=plan_1"
        );
        assert_eq!(
            list_path(Some("plan_1"), Some("cust 7")),
            "subscriptions?plan_id=plan_1&external_customer_id=cust%207"
        );
        assert_eq!(
            list_path(None, Some("c&d")),
            "subscriptions?external_customer_id=c%26d"
        );
    }

    #[test]
    fn test_normalization() {
        assert_eq!(into_list(json!({"a": 1})), Vec::<Value>::new());
        assert_eq!(into_list(json!([1])), vec![json!(1)]);
        assert!(into_map(json!([1])).is_empty());
        assert_eq!(into_map(json!({"a": 1}))["a"], 1);
    }
}
