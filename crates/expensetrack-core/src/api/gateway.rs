//! The single HTTP transport to the expense-tracking service.
//!
//! `ApiGateway` owns the base URL, the request timeout and the default
//! bearer credential. It classifies every response into an [`Outcome`] and
//! logs a redacted view of each exchange. It never retries, never touches
//! the session store and never navigates; those policies belong to
//! [`AuthFlow`](crate::auth::AuthFlow).

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::outcome::{Failure, FailureKind, Outcome};
use super::ApiError;
use crate::utils::redacted_body;

/// Default request timeout, matching what the mobile client shipped with.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Honor HTTP(S)_PROXY from the environment.
    pub use_system_proxy: bool,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_millis(timeout_ms),
            use_system_proxy: true,
        }
    }
}

/// One outbound call: method, path relative to the base URL, extra headers
/// and an optional JSON body.
#[derive(Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    /// Explicit per-request credential. When `None` the gateway's default
    /// credential (if any) is used.
    pub bearer_override: Option<String>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            bearer_override: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Ok(Self::new(Method::POST, path).with_body(serde_json::to_value(body)?))
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_override = Some(token.into());
        self
    }
}

impl std::fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("body", &redacted_body(self.body.as_ref()))
            .field("bearer_override", &self.bearer_override.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// HTTP gateway to the remote service.
///
/// Share it behind an `Arc`; the default credential is the only mutable
/// state and every request snapshots it exactly once.
pub struct ApiGateway {
    client: Client,
    base_url: String,
    credential: RwLock<Option<String>>,
}

impl ApiGateway {
    /// Build the gateway. Called once at process start.
    pub fn configure(config: &GatewayConfig) -> Result<Self, ApiError> {
        Url::parse(&config.base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let mut defaults = HeaderMap::new();
        defaults.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        defaults.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .timeout(config.timeout)
            .default_headers(defaults);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(ApiError::Client)?;

        debug!(base_url = %config.base_url, timeout_ms = config.timeout.as_millis() as u64, "Gateway configured");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install (`Some`) or remove (`None`) the default bearer credential.
    /// An empty token counts as `None`.
    pub async fn set_credential(&self, token: Option<String>) {
        let token = token.filter(|t| !t.is_empty());
        debug!(installed = token.is_some(), "Default credential updated");
        *self.credential.write().await = token;
    }

    pub async fn has_credential(&self) -> bool {
        self.credential.read().await.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Final header set for one request. A call-site `Authorization` entry is
    /// discarded; the credential is attached here and nowhere else.
    fn request_headers(mut headers: HeaderMap, token: Option<&str>) -> Result<HeaderMap, ApiError> {
        if headers.remove(header::AUTHORIZATION).is_some() {
            warn!("Discarding call-site Authorization header; use a bearer override instead");
        }
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidHeader("authorization"))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Non-2xx bodies are kept for the caller: JSON when it parses, the raw
    /// text otherwise.
    fn failure_body(text: &str) -> Option<Value> {
        if text.trim().is_empty() {
            return None;
        }
        Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
    }

    /// Issue one HTTP call and classify the result.
    ///
    /// Only unexpected faults are returned as `Err`: an unbuildable request
    /// or a 2xx body that is not JSON.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Outcome, ApiError> {
        let RequestDescriptor { method, path, headers, body, bearer_override } = descriptor;

        // Snapshot the credential once; a concurrent set_credential cannot
        // affect this request past this point.
        let token = match bearer_override.filter(|t| !t.is_empty()) {
            Some(token) => Some(token),
            None => self.credential.read().await.clone(),
        };
        let headers = Self::request_headers(headers, token.as_deref())?;

        debug!(
            method = %method,
            path = %path,
            authorized = token.is_some(),
            body = %redacted_body(body.as_ref()),
            "Sending request"
        );

        let mut builder = self.client.request(method.clone(), self.url(&path)).headers(headers);
        if let Some(ref body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Ok(Self::network_failure(&method, &path, e)),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Ok(Self::network_failure(&method, &path, e)),
        };

        match FailureKind::from_status(status) {
            None => {
                let body = if text.trim().is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(&text).map_err(|e| {
                        error!(method = %method, path = %path, status = status.as_u16(), error = %e, "Unparseable response body");
                        ApiError::invalid_response(&path, &text, e)
                    })?
                };
                debug!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    body = %redacted_body(Some(&body)),
                    "Response received"
                );
                Ok(Outcome::Success { status, body })
            }
            Some(kind) => {
                let body = Self::failure_body(&text);
                warn!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    kind = ?kind,
                    body = %redacted_body(body.as_ref()),
                    "Request rejected"
                );
                Ok(Outcome::Failure(Failure::from_response(kind, status, body)))
            }
        }
    }

    fn network_failure(method: &Method, path: &str, e: reqwest::Error) -> Outcome {
        let timed_out = e.is_timeout();
        warn!(method = %method, path = %path, timed_out, error = %e, "Request failed");
        Outcome::Failure(Failure::network(e.to_string(), timed_out))
    }
}
