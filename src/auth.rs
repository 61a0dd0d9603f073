//! Bearer token acquisition and caching
//!
//! [`TokenManager`] exchanges the client's key pair for a short-lived bearer
//! token and caches it. A cached token is reused until 60 seconds before its
//! expiry. Refresh is single-flight: concurrent callers that find the token
//! expired wait for one exchange instead of each issuing their own, and share
//! its outcome whether it succeeded or failed.

use crate::config::Config;
use crate::envelope::EnvelopeDecoder;
use crate::transport::{send_with_timeout, RequestBody, Transport, TransportRequest};
use crate::types::ResponseMeta;
use crate::{Result, TinkerError};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use http::Method;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lifetime assumed when the auth response omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Tokens are treated as expired this many seconds early
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Type alias for the clock function
pub type ClockFn = dyn Fn() -> DateTime<Utc> + Send + Sync;

/// Type alias for the clock function wrapped in Arc
pub type ClockFnArc = Arc<ClockFn>;

/// An issued bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the token can still be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .checked_sub_signed(ChronoDuration::seconds(EXPIRY_MARGIN_SECS))
            .map_or(false, |deadline| now < deadline)
    }
}

/// Cache guarded by the refresh lock
#[derive(Default)]
struct TokenState {
    token: Option<Token>,
    /// Error of the last exchange, tagged with that exchange's number
    failure: Option<(u64, TinkerError)>,
}

/// Acquires, caches and refreshes bearer tokens
pub struct TokenManager {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    state: Mutex<TokenState>,
    exchanges: AtomicU64,
    decoder: EnvelopeDecoder,
    clock: ClockFnArc,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("auth_url", &self.config.auth_url())
            .field("transport", &"<transport>")
            .field("clock", &"<function>")
            .finish()
    }
}

impl TokenManager {
    /// Create a token manager using the system clock
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            state: Mutex::new(TokenState::default()),
            exchanges: AtomicU64::new(0),
            decoder: EnvelopeDecoder::new(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock used for expiry checks
    pub fn with_clock(mut self, clock: ClockFnArc) -> Self {
        self.clock = clock;
        self
    }

    /// Return a valid bearer token, exchanging credentials if needed.
    ///
    /// The cache lock is held across the exchange, so callers arriving while a
    /// refresh is in flight reuse its result. A failed exchange is returned to
    /// every caller that was already waiting on it; later callers try again.
    pub async fn get_token(&self) -> Result<String> {
        let seen = self.exchanges.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if let Some(token) = state.token.as_ref() {
            if token.is_valid_at((self.clock)()) {
                return Ok(token.value.clone());
            }
            tracing::debug!(expires_at = %token.expires_at, "Cached token expired, refreshing");
        }

        if let Some((exchange, error)) = state.failure.as_ref() {
            if *exchange > seen {
                return Err(error.clone());
            }
        }

        let result = self.fetch_token().await;
        let exchange = self.exchanges.fetch_add(1, Ordering::AcqRel) + 1;

        match result {
            Ok(token) => {
                let value = token.value.clone();
                state.token = Some(token);
                state.failure = None;
                Ok(value)
            }
            Err(e) => {
                state.failure = Some((exchange, e.clone()));
                Err(e)
            }
        }
    }

    /// Drop the cached token so the next call re-authenticates
    pub async fn invalidate(&self) {
        self.state.lock().await.token = None;
    }

    /// The currently cached token, valid or not
    pub async fn cached_token(&self) -> Option<Token> {
        self.state.lock().await.token.clone()
    }

    /// Seed the cache, e.g. with a token persisted from an earlier session
    pub async fn set_token(&self, token: Token) {
        let mut state = self.state.lock().await;
        state.token = Some(token);
        state.failure = None;
    }

    /// Metadata from the most recent auth response
    pub async fn last_meta(&self) -> Option<ResponseMeta> {
        self.decoder.last_meta().await
    }

    async fn fetch_token(&self) -> Result<Token> {
        let credentials = general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.config.public_key(),
            self.config.secret_key()
        ));

        let request = TransportRequest::new(
            Method::POST,
            self.config.auth_url(),
            self.config.timeout(),
        )
        .with_header("Accept", "application/json")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_body(RequestBody::Form(vec![(
            "credentials".to_string(),
            credentials,
        )]));

        tracing::debug!("Requesting access token from: {}", self.config.auth_url());

        let response = send_with_timeout(self.transport.as_ref(), request)
            .await
            .map_err(|e| TinkerError::network(format!("Failed to authenticate: {}", e.message())))?;
        let body = response.json_body()?;

        let data = self.decoder.decode(&body, response.status).await.map_err(|e| {
            tracing::warn!(status = response.status, error = %e, "Authentication rejected");
            e
        })?;

        let token = token_text(data.get("token")).ok_or_else(|| {
            TinkerError::api("Invalid authentication response: token missing")
        })?;

        let expires_in = parse_expires_in(data.get("expires_in"))?;
        let expires_at = expiry_after((self.clock)(), expires_in)?;

        tracing::debug!(%expires_at, "Access token issued");
        Ok(Token::new(token, expires_at))
    }
}

/// Any truthy scalar is a token; empty strings, zero and `false` are not
fn token_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(token) if !token.is_empty() => Some(token.clone()),
        Value::Number(token) if token.as_f64().map_or(true, |n| n != 0.0) => {
            Some(token.to_string())
        }
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>> {
    ChronoDuration::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            TinkerError::api("Invalid authentication response: expires_in out of range")
        })
}

fn parse_expires_in(value: Option<&Value>) -> Result<i64> {
    let invalid = || TinkerError::api("Invalid authentication response: expires_in is not an integer");
    match value {
        None | Some(Value::Null) => Ok(DEFAULT_EXPIRES_IN_SECS),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    struct AuthTransport {
        calls: AtomicUsize,
        response: TransportResponse,
        delay: std::time::Duration,
        requests: StdMutex<Vec<TransportRequest>>,
    }

    impl AuthTransport {
        fn new(status: u16, body: Value) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: TransportResponse::new(status, body.to_string()),
                delay: std::time::Duration::ZERO,
                requests: StdMutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for AuthTransport {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.response.clone())
        }
    }

    fn token_body() -> Value {
        json!({
            "success": true,
            "data": {"token": "abc123", "expires_in": 3600},
            "meta": {"request_id": "R1", "environment": "sandbox"}
        })
    }

    fn fixed_clock(now: DateTime<Utc>) -> ClockFnArc {
        Arc::new(move || now)
    }

    fn build_manager(transport: Arc<AuthTransport>) -> TokenManager {
        let config = Arc::new(Config::new("pk_test_1", "sk_test_1"));
        TokenManager::new(config, transport)
    }

    #[test]
    fn test_token_validity_margin() {
        let expires_at = Utc::now();
        let token = Token::new("t", expires_at);
        assert!(token.is_valid_at(expires_at - ChronoDuration::seconds(61)));
        assert!(!token.is_valid_at(expires_at - ChronoDuration::seconds(60)));
        assert!(!token.is_valid_at(expires_at - ChronoDuration::seconds(59)));
    }

    #[test]
    fn test_token_debug_redacts_value() {
        let token = Token::new("secret-token", Utc::now());
        assert!(!format!("{:?}", token).contains("secret-token"));
    }

    #[tokio::test]
    async fn test_credential_exchange() {
        let transport = Arc::new(AuthTransport::new(200, token_body()));
        let manager = build_manager(transport.clone());

        assert_eq!(manager.get_token().await.unwrap(), "abc123");
        assert_eq!(transport.calls(), 1);

        let requests = transport.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(
            request.url,
            "https://sandbox-api.tinkerpayments.com/v1/auth/token"
        );
        assert_eq!(request.header("Accept"), Some("application/json"));
        let expected = general_purpose::STANDARD.encode("pk_test_1:sk_test_1");
        assert_eq!(
            request.body,
            RequestBody::Form(vec![("credentials".to_string(), expected)])
        );
    }

    #[tokio::test]
    async fn test_records_auth_meta() {
        let transport = Arc::new(AuthTransport::new(200, token_body()));
        let manager = build_manager(transport);
        manager.get_token().await.unwrap();

        let meta = manager.last_meta().await.unwrap();
        assert_eq!(meta.request_id.as_deref(), Some("R1"));
        assert_eq!(meta.environment.as_deref(), Some("sandbox"));
    }

    #[tokio::test]
    async fn test_cached_token_reused_before_margin() {
        let now = Utc::now();
        let transport = Arc::new(AuthTransport::new(200, token_body()));
        let manager = build_manager(transport.clone()).with_clock(fixed_clock(now));
        manager
            .set_token(Token::new("cached", now + ChronoDuration::seconds(61)))
            .await;

        assert_eq!(manager.get_token().await.unwrap(), "cached");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_token_refreshed_inside_margin() {
        let now = Utc::now();
        let transport = Arc::new(AuthTransport::new(200, token_body()));
        let manager = build_manager(transport.clone()).with_clock(fixed_clock(now));
        manager
            .set_token(Token::new("cached", now + ChronoDuration::seconds(59)))
            .await;

        assert_eq!(manager.get_token().await.unwrap(), "abc123");
        assert_eq!(transport.calls(), 1);

        let token = manager.cached_token().await.unwrap();
        assert_eq!(token.expires_at(), now + ChronoDuration::seconds(3600));
    }

    #[tokio::test]
    async fn test_default_expires_in() {
        let now = Utc::now();
        let body = json!({"success": true, "data": {"token": "t"}});
        let transport = Arc::new(AuthTransport::new(200, body));
        let manager = build_manager(transport).with_clock(fixed_clock(now));

        manager.get_token().await.unwrap();
        let token = manager.cached_token().await.unwrap();
        assert_eq!(
            token.expires_at(),
            now + ChronoDuration::seconds(DEFAULT_EXPIRES_IN_SECS)
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_api_error() {
        let body = json!({"success": true, "data": {"expires_in": 3600}});
        let manager = build_manager(Arc::new(AuthTransport::new(200, body)));
        let err = manager.get_token().await.unwrap_err();
        assert!(err.is_api());
        assert!(err.message().contains("token missing"));

        let body = json!({"success": true, "data": {"token": ""}});
        let manager = build_manager(Arc::new(AuthTransport::new(200, body)));
        assert!(manager.get_token().await.unwrap_err().is_api());
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let body = json!({"success": false, "error": {"message": "Invalid credentials"}});
        let manager = build_manager(Arc::new(AuthTransport::new(401, body)));
        let err = manager.get_token().await.unwrap_err();
        assert_eq!(err, TinkerError::api("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_malformed_auth_response_is_network_error() {
        let transport = Arc::new(AuthTransport {
            calls: AtomicUsize::new(0),
            response: TransportResponse::new(200, "not json"),
            delay: std::time::Duration::ZERO,
            requests: StdMutex::new(Vec::new()),
        });
        let err = build_manager(transport).get_token().await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let transport = Arc::new(AuthTransport {
            delay: std::time::Duration::from_millis(50),
            ..AuthTransport::new(200, token_body())
        });
        let manager = Arc::new(build_manager(transport.clone()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.get_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "abc123");
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let transport = Arc::new(AuthTransport::new(200, token_body()));
        let manager = build_manager(transport.clone());

        manager.get_token().await.unwrap();
        manager.invalidate().await;
        manager.get_token().await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_shared_by_waiters() {
        let body = json!({"success": false, "error": {"message": "Service unavailable"}});
        let transport = Arc::new(AuthTransport {
            delay: std::time::Duration::from_millis(50),
            ..AuthTransport::new(503, body)
        });
        let manager = Arc::new(build_manager(transport.clone()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.get_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.await.unwrap().unwrap_err(),
                TinkerError::api("Service unavailable")
            );
        }
        assert_eq!(transport.calls(), 1);

        // A caller arriving after the failure starts a new exchange
        assert!(manager.get_token().await.is_err());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_expires_in() {
        for expires_in in [json!(i64::MAX), json!(i64::MIN), json!(1e300)] {
            let body = json!({"success": true, "data": {"token": "t", "expires_in": expires_in}});
            let manager = build_manager(Arc::new(AuthTransport::new(200, body)));

            let err = manager.get_token().await.unwrap_err();
            assert_eq!(
                err,
                TinkerError::api("Invalid authentication response: expires_in out of range")
            );
            assert!(manager.cached_token().await.is_none());
        }
    }

    #[test]
    fn test_expiry_near_calendar_bounds() {
        let token = Token::new("t", DateTime::<Utc>::MIN_UTC);
        assert!(!token.is_valid_at(DateTime::<Utc>::MIN_UTC));

        let now = DateTime::<Utc>::MAX_UTC - ChronoDuration::seconds(10);
        assert!(expiry_after(now, 3600).is_err());
        assert_eq!(expiry_after(now, 5).unwrap(), now + ChronoDuration::seconds(5));
    }

    #[test]
    fn test_token_text_truthiness() {
        assert_eq!(token_text(Some(&json!("abc"))).as_deref(), Some("abc"));
        assert_eq!(token_text(Some(&json!(42))).as_deref(), Some("42"));
        assert_eq!(token_text(Some(&json!(true))).as_deref(), Some("true"));
        assert_eq!(token_text(Some(&json!(""))), None);
        assert_eq!(token_text(Some(&json!(0))), None);
        assert_eq!(token_text(Some(&json!(false))), None);
        assert_eq!(token_text(Some(&json!(null))), None);
        assert_eq!(token_text(Some(&json!({"value": "abc"}))), None);
        assert_eq!(token_text(None), None);
    }

    #[test]
    fn test_parse_expires_in() {
        assert_eq!(parse_expires_in(None).unwrap(), 3600);
        assert_eq!(parse_expires_in(Some(&json!(120))).unwrap(), 120);
        assert_eq!(parse_expires_in(Some(&json!("90"))).unwrap(), 90);
        assert!(parse_expires_in(Some(&json!("soon"))).is_err());
        assert!(parse_expires_in(Some(&json!([1]))).is_err());
    }
}
