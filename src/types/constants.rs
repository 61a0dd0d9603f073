//! API endpoint and environment constants

/// API roots and paths relative to the versioned base URL
pub mod endpoints {
    /// Sandbox API root, selected for `pk_test_` / `sk_test_` keys
    pub const SANDBOX_BASE_URL: &str = "https://sandbox-api.tinkerpayments.com";
    /// Production API root
    pub const PRODUCTION_BASE_URL: &str = "https://api.tinkerpayments.com";
    /// Version segment every base URL ends with
    pub const API_VERSION_PATH: &str = "/v1";
    /// Token exchange path, appended to the versioned root
    pub const AUTH_TOKEN_PATH: &str = "/auth/token";

    /// Payment initiation
    pub const PAYMENT_INITIATE_PATH: &str = "api/payment/initiate";
    /// Payment status query
    pub const PAYMENT_QUERY_PATH: &str = "api/payment/query";

    /// Subscriptions collection
    pub const SUBSCRIPTION_BASE_PATH: &str = "subscriptions";
    /// Subscription plans collection
    pub const SUBSCRIPTION_PLANS_PATH: &str = "subscriptions/plans";

    /// Path to cancel a subscription
    pub fn subscription_cancel_path(subscription_id: &str) -> String {
        format!("{}/{}/cancel", SUBSCRIPTION_BASE_PATH, subscription_id)
    }
}

/// Key prefixes that select the sandbox environment
pub mod key_prefixes {
    /// Public key prefix for test-mode keys
    pub const PUBLIC_TEST: &str = "pk_test_";
    /// Secret key prefix for test-mode keys
    pub const SECRET_TEST: &str = "sk_test_";

    /// Whether either key is a test-mode key
    pub fn is_test_mode(public_key: &str, secret_key: &str) -> bool {
        public_key.starts_with(PUBLIC_TEST) || secret_key.starts_with(SECRET_TEST)
    }
}

/// Transaction status values reported by the API
pub mod statuses {
    /// Payment has not completed yet
    pub const PENDING: &str = "pending";
    /// Payment succeeded
    pub const SUCCESS: &str = "success";
    /// Payment was cancelled
    pub const CANCELLED: &str = "cancelled";
    /// Payment failed
    pub const FAILED: &str = "failed";
}
