//! # Tinker Payments Rust SDK
//!
//! A **type-safe, async** client for the Tinker Payments API.
//!
//! ## Features
//!
//! - 🔑 **Bearer authentication**: Tokens are exchanged, cached and refreshed automatically,
//!   with a single refresh shared by concurrent callers
//! - 📦 **Envelope decoding**: `{success, data, meta, error}` responses unwrap into typed
//!   results or a structured error
//! - 💳 **Payments**: Initiate and query payments through Mpesa, Paystack, Stripe or any
//!   other gateway the API routes
//! - 🔁 **Subscriptions**: Plans, subscriptions and cancellation
//! - 🔒 **Webhooks**: Typed event decoding and constant-time HMAC-SHA256 verification
//! - 🔌 **Pluggable transport**: `reqwest` by default, or any [`transport::Transport`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use tinker_payments::{Gateway, TinkerClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Test keys select the sandbox automatically
//!     let client = TinkerClient::new("pk_test_123", "sk_test_123")?;
//!
//!     let payment = client
//!         .transactions()
//!         .initiate_via(
//!             &Gateway::Mpesa,
//!             &json!({
//!                 "amount": 100,
//!                 "currency": "KES",
//!                 "customerPhone": "254700000000",
//!                 "merchantReference": "ORDER-1",
//!             }),
//!         )
//!         .await?;
//!
//!     if let Some(reference) = payment.payment_reference() {
//!         let status = client.transactions().query_via(&Gateway::Mpesa, &reference).await?;
//!         println!("Payment {} is {}", reference, status.status);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`config`**: Immutable client configuration and environment selection
//! - **`auth`**: Token exchange and caching
//! - **`envelope`**: Response envelope decoding
//! - **`transport`**: HTTP transport abstraction
//! - **`client`**: Authenticated client and domain managers
//! - **`webhook`**: Webhook decoding and signature verification
//! - **`types`**: Shared data types
//! - **`error`**: Error taxonomy

pub mod auth;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod transport;
pub mod types;
pub mod webhook;

// Re-exports for convenience
pub use auth::{Token, TokenManager};
pub use client::{Gateway, RequestExecutor, SubscriptionManager, TinkerClient, TransactionManager};
pub use config::Config;
pub use error::{Result, TinkerError};
pub use types::*;
pub use webhook::{WebhookEvent, WebhookHandler};

/// Current version of the SDK
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(endpoints::API_VERSION_PATH, "/v1");
        assert_eq!(endpoints::AUTH_TOKEN_PATH, "/auth/token");
        assert_eq!(
            endpoints::subscription_cancel_path("sub_1"),
            "subscriptions/sub_1/cancel"
        );
    }

    #[test]
    fn test_key_prefixes() {
        assert!(key_prefixes::is_test_mode("pk_test_1", "sk_live_1"));
        assert!(key_prefixes::is_test_mode("pk_live_1", "sk_test_1"));
        assert!(!key_prefixes::is_test_mode("pk_live_1", "sk_live_1"));
    }

    #[test]
    fn test_client_exposes_config() {
        let client = TinkerClient::new("pk_live_1", "sk_live_1").unwrap();
        assert_eq!(client.config().base_url(), "https://api.tinkerpayments.com/v1/");
    }
}
