//! Authenticated API client
//!
//! [`TinkerClient`] is the entry point of the SDK. It owns the configuration,
//! the shared [`TokenManager`], the domain managers and the webhook handler.
//!
//! # Architecture
//!
//! - [`RequestExecutor`] - Attaches the bearer token, sends through the
//!   [`Transport`] and decodes the response envelope
//! - [`transactions`] - Payment initiation and status queries
//! - [`subscriptions`] - Plans and subscriptions
//! - [`gateway`] - Gateway-stamped request bodies for payment calls
//!
//! # Examples
//!
//! ```no_run
//! use serde_json::json;
//! use tinker_payments::TinkerClient;
//!
//! # async fn example() -> tinker_payments::Result<()> {
//! let client = TinkerClient::new("pk_test_123", "sk_test_123")?;
//!
//! let transaction = client
//!     .transactions()
//!     .initiate(json!({"amount": 100, "currency": "KES", "gateway": "mpesa"}))
//!     .await?;
//!
//! if transaction.is_pending() {
//!     println!("Reference: {:?}", transaction.payment_reference());
//! }
//! # Ok(())
//! # }
//! ```

use crate::auth::TokenManager;
use crate::config::Config;
use crate::envelope::EnvelopeDecoder;
use crate::transport::{send_with_timeout, ReqwestTransport, RequestBody, Transport, TransportRequest};
use crate::types::ResponseMeta;
use crate::webhook::WebhookHandler;
use crate::{Result, TinkerError};
use http::Method;
use serde_json::Value;
use std::sync::Arc;

pub mod gateway;
pub mod subscriptions;
pub mod transactions;


pub use gateway::Gateway;
pub use subscriptions::SubscriptionManager;
pub use transactions::TransactionManager;

/// Sends bearer-authenticated requests and unwraps their envelopes
pub struct RequestExecutor {
    config: Arc<Config>,
    auth: Arc<TokenManager>,
    transport: Arc<dyn Transport>,
    decoder: EnvelopeDecoder,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.config.base_url())
            .field("transport", &"<transport>")
            .finish()
    }
}

impl RequestExecutor {
    pub fn new(config: Arc<Config>, auth: Arc<TokenManager>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            auth,
            transport,
            decoder: EnvelopeDecoder::new(),
        }
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send an authenticated request and return the unwrapped payload.
    ///
    /// Token acquisition and API failures propagate unchanged; anything that
    /// goes wrong on the wire becomes a network error.
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.url_for(path);
        let token = self.auth.get_token().await?;

        let body = match body {
            Some(Value::Object(map)) if map.is_empty() => RequestBody::Empty,
            Some(Value::Null) | None => RequestBody::Empty,
            Some(body) => RequestBody::Json(body),
        };

        let request = TransportRequest::new(method.clone(), url.clone(), self.config.timeout())
            .with_header("Authorization", format!("Bearer {}", token))
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "application/json")
            .with_body(body);

        tracing::debug!("Sending {} request to: {}", method, url);

        let response = send_with_timeout(self.transport.as_ref(), request)
            .await
            .and_then(|response| {
                let body = response.json_body()?;
                Ok((response.status, body))
            });

        let (status, body) = response.map_err(|e| {
            TinkerError::network(format!(
                "Failed to communicate with Tinker API: {}",
                e.message()
            ))
        })?;

        self.decoder.decode(&body, status).await.map_err(|e| {
            tracing::warn!(%method, %url, status, error = %e, "Tinker API request failed");
            e
        })
    }

    /// Metadata of the last envelope this executor decoded
    pub async fn last_meta(&self) -> Option<ResponseMeta> {
        self.decoder.last_meta().await
    }
}

/// Client for the Tinker Payments API
pub struct TinkerClient {
    config: Arc<Config>,
    auth: Arc<TokenManager>,
    transactions: TransactionManager,
    subscriptions: SubscriptionManager,
    webhooks: WebhookHandler,
}

impl std::fmt::Debug for TinkerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TinkerClient")
            .field("config", &self.config)
            .finish()
    }
}

impl TinkerClient {
    /// Create a client from a key pair; the base URL follows the key prefixes
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        Self::from_config(Config::new(public_key, secret_key))
    }

    /// Create a client from environment variables, see [`Config::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::from_config(Config::from_env()?)
    }

    /// Create a client using the default `reqwest` transport
    pub fn from_config(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client that sends every request through `transport`
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let auth = Arc::new(TokenManager::new(config.clone(), transport.clone()));

        let executor = || RequestExecutor::new(config.clone(), auth.clone(), transport.clone());
        let transactions = TransactionManager::new(executor());
        let subscriptions = SubscriptionManager::new(executor());

        Ok(Self {
            config,
            auth,
            transactions,
            subscriptions,
            webhooks: WebhookHandler::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn webhooks(&self) -> &WebhookHandler {
        &self.webhooks
    }

    /// The shared token manager
    pub fn auth(&self) -> &TokenManager {
        &self.auth
    }

    /// Metadata from the most recent token exchange
    pub async fn last_auth_meta(&self) -> Option<ResponseMeta> {
        self.auth.last_meta().await
    }
}
