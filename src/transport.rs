//! HTTP transport abstraction
//!
//! The SDK never opens sockets itself: every request goes through a
//! [`Transport`]. [`ReqwestTransport`] is the default implementation; tests and
//! embedders can plug in their own.

use crate::{Result, TinkerError};
use async_trait::async_trait;
use http::Method;
use serde_json::{Map, Value};
use std::time::Duration;

/// Body of an outgoing request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body
    Empty,
    /// JSON document
    Json(Value),
    /// `application/x-www-form-urlencoded` fields
    Form(Vec<(String, String)>),
}

/// A fully resolved outgoing request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl TransportRequest {
    /// Create a request with no headers and no body
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout,
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Look up a header value, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response returned by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as received
    pub text: String,
}

impl TransportResponse {
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    /// Parse the body as JSON. An empty body decodes as `{}`.
    pub fn json_body(&self) -> Result<Value> {
        if self.text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&self.text).map_err(|e| {
            TinkerError::network(format!(
                "Malformed response body (status {}): {}",
                self.status, e
            ))
        })
    }
}

/// Sends HTTP requests on behalf of the SDK
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response.
    ///
    /// Implementations report connection-level failures as
    /// [`TinkerError::Network`]; non-2xx statuses are not errors here.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Send through `transport`, failing with a network error once the request's
/// timeout elapses
pub async fn send_with_timeout(
    transport: &dyn Transport,
    request: TransportRequest,
) -> Result<TransportResponse> {
    let timeout = request.timeout;
    let url = request.url.clone();
    match tokio::time::timeout(timeout, transport.send(request)).await {
        Ok(result) => result,
        Err(_) => Err(TinkerError::network(format!(
            "Request to {} timed out after {:?}",
            url, timeout
        ))),
    }
}

/// [`Transport`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh HTTP client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TinkerError::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing HTTP client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .timeout(request.timeout);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Form(fields) => builder.form(&fields),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(TransportResponse { status, text })
    }
}
