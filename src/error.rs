//! Error types for the Tinker SDK
//!
//! Every fallible operation returns [`Result`]. Failures fall into three kinds
//! that callers are expected to branch on:
//!
//! - [`TinkerError::Api`] - the API was reached and reported a structured failure
//! - [`TinkerError::Network`] - the request never produced a decodable response
//! - [`TinkerError::InvalidPayload`] - a webhook payload could not be decoded
//!
//! [`TinkerError::Config`] is only returned while building a client.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, TinkerError>;

/// Errors produced by the Tinker SDK
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TinkerError {
    /// The API returned `success: false`, a status >= 400, or omitted a required field
    #[error("API error: {message}")]
    Api { message: String },

    /// Connection failure, timeout, or a response body that is not JSON
    #[error("Network error: {message}")]
    Network { message: String },

    /// Malformed or unrecognized webhook payload
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    /// Invalid client configuration
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl TinkerError {
    /// Create an API error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an invalid payload error
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The human-readable message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Api { message }
            | Self::Network { message }
            | Self::InvalidPayload { message }
            | Self::Config { message } => message,
        }
    }

    /// Whether this is an API error
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Whether this is a network error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Whether this is an invalid payload error
    pub fn is_invalid_payload(&self) -> bool {
        matches!(self, Self::InvalidPayload { .. })
    }
}

impl From<reqwest::Error> for TinkerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("Request timed out: {}", err))
        } else {
            Self::network(err.to_string())
        }
    }
}
