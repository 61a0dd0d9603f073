//! Client configuration and environment resolution

use crate::types::{endpoints, key_prefixes};
use crate::{Result, TinkerError};
use std::env;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the public key
pub const PUBLIC_KEY_ENV: &str = "TINKER_API_PUBLIC_KEY";
/// Environment variable holding the secret key
pub const SECRET_KEY_ENV: &str = "TINKER_API_SECRET_KEY";
/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "TINKER_BASE_URL";

/// Immutable client configuration
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    public_key: String,
    secret_key: String,
    base_url: String,
    auth_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("auth_url", &self.auth_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Create a config whose base URL is picked from the key prefixes
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_base_url(public_key, secret_key, None::<String>)
    }

    /// Create a config with an optional base URL override.
    ///
    /// A blank override falls back to sandbox/production selection. The result
    /// always ends with the `/v1` segment and a trailing slash.
    pub fn with_base_url(
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
        base_url: Option<impl Into<String>>,
    ) -> Self {
        let public_key = public_key.into();
        let secret_key = secret_key.into();

        let root = base_url
            .map(Into::into)
            .filter(|url: &String| !url.trim().is_empty())
            .unwrap_or_else(|| {
                if key_prefixes::is_test_mode(&public_key, &secret_key) {
                    endpoints::SANDBOX_BASE_URL.to_string()
                } else {
                    endpoints::PRODUCTION_BASE_URL.to_string()
                }
            });

        let mut root = root.trim().trim_end_matches('/').to_string();
        if !root.ends_with(endpoints::API_VERSION_PATH) {
            root.push_str(endpoints::API_VERSION_PATH);
        }

        Self {
            auth_url: format!("{}{}", root, endpoints::AUTH_TOKEN_PATH),
            base_url: format!("{}/", root),
            public_key,
            secret_key,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load keys and an optional base URL override from the environment
    pub fn from_env() -> Result<Self> {
        let public_key = env::var(PUBLIC_KEY_ENV).unwrap_or_default();
        let secret_key = env::var(SECRET_KEY_ENV).unwrap_or_default();

        if public_key.is_empty() || secret_key.is_empty() {
            return Err(TinkerError::config(format!(
                "Missing credentials: {} and {} must be set",
                PUBLIC_KEY_ENV, SECRET_KEY_ENV
            )));
        }

        let config = Self::with_base_url(public_key, secret_key, env::var(BASE_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.public_key.is_empty() {
            return Err(TinkerError::config("Public key cannot be empty"));
        }
        if self.secret_key.is_empty() {
            return Err(TinkerError::config("Secret key cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(TinkerError::config("Timeout must be greater than zero"));
        }

        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| TinkerError::config(format!("Invalid base URL: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(TinkerError::config(
                "Base URL must start with http:// or https://",
            ));
        }

        Ok(())
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Versioned API root, always ending with `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token exchange endpoint
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the resolved base URL points at the sandbox
    pub fn is_sandbox(&self) -> bool {
        self.base_url.starts_with(endpoints::SANDBOX_BASE_URL)
    }
}
