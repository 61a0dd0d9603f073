//! Payment initiation and status queries

use super::gateway::{self, Gateway};
use super::RequestExecutor;
use crate::types::{endpoints, ResponseMeta, Transaction};
use crate::Result;
use http::Method;
use serde::Serialize;
use serde_json::Value;

/// Typed operations over the payment endpoints
#[derive(Debug)]
pub struct TransactionManager {
    executor: RequestExecutor,
}

impl TransactionManager {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// Start a payment. The payload is sent as-is.
    pub async fn initiate(&self, payload: Value) -> Result<Transaction> {
        let response = self
            .executor
            .request(Method::POST, endpoints::PAYMENT_INITIATE_PATH, Some(payload))
            .await?;
        Ok(Transaction::from_value(response))
    }

    /// Query the status of a payment. The payload is sent as-is.
    pub async fn query(&self, payload: Value) -> Result<Transaction> {
        let response = self
            .executor
            .request(Method::POST, endpoints::PAYMENT_QUERY_PATH, Some(payload))
            .await?;
        Ok(Transaction::from_value(response))
    }

    /// Start a payment through `gateway`, stamping the gateway name on the body
    pub async fn initiate_via<T: Serialize>(&self, gateway: &Gateway, request: &T) -> Result<Transaction> {
        let payload = gateway::initiation_payload(gateway, request)?;
        self.initiate(payload).await
    }

    /// Query a payment made through `gateway` by its payment reference
    pub async fn query_via(&self, gateway: &Gateway, payment_reference: &str) -> Result<Transaction> {
        let payload = gateway::query_payload(gateway, payment_reference)?;
        self.query(payload).await
    }

    /// Metadata from the last payment call
    pub async fn last_meta(&self) -> Option<ResponseMeta> {
        self.executor.last_meta().await
    }
}
