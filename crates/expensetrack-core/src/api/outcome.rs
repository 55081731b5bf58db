//! Typed result of every gateway call.
//!
//! Expected failures are values, not errors: a screen matches on
//! [`Outcome`] to decide between rendering data and showing a
//! [`Notification`].

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::notification::Notification;

/// Why a call did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server rejected the credential (HTTP 401).
    Unauthorized,
    /// Timeout, DNS failure, refused connection and similar transport faults.
    NetworkError,
    /// HTTP 5xx, or any status the client has no other classification for.
    ServerError,
    /// HTTP 4xx other than 401, or a payload that failed validation.
    ValidationError,
}

impl FailureKind {
    /// Classify a response status. Returns `None` for 2xx.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status.as_u16() {
            200..=299 => None,
            401 => Some(FailureKind::Unauthorized),
            400..=499 => Some(FailureKind::ValidationError),
            _ => Some(FailureKind::ServerError),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: FailureKind,
    pub status: Option<StatusCode>,
    pub body: Option<Value>,
    /// Diagnostic text for failures that carry no server body.
    pub detail: Option<String>,
    pub timed_out: bool,
}

impl Failure {
    pub fn network(detail: impl Into<String>, timed_out: bool) -> Self {
        Self {
            kind: FailureKind::NetworkError,
            status: None,
            body: None,
            detail: Some(detail.into()),
            timed_out,
        }
    }

    pub fn from_response(kind: FailureKind, status: StatusCode, body: Option<Value>) -> Self {
        Self {
            kind,
            status: Some(status),
            body,
            detail: None,
            timed_out: false,
        }
    }

    pub fn validation(detail: impl Into<String>, status: Option<StatusCode>, body: Option<Value>) -> Self {
        Self {
            kind: FailureKind::ValidationError,
            status,
            body,
            detail: Some(detail.into()),
            timed_out: false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == FailureKind::Unauthorized
    }

    /// The server's `message` field, when the body carries a non-empty one.
    pub fn server_message(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// User-facing notification; `fallback` is used when the server gave no
    /// usable message.
    pub fn notification(&self, fallback: &str) -> Notification {
        match self.kind {
            FailureKind::Unauthorized => {
                Notification::error_titled("Session Expired", "Please login again")
            }
            FailureKind::NetworkError if self.timed_out => {
                Notification::error("Connection timed out. Please try again.")
            }
            FailureKind::NetworkError => {
                Notification::error("Unable to connect to server. Check your internet connection.")
            }
            // A 2xx payload that failed validation: the server's message (if
            // any) describes a success, so show what was wrong with it.
            FailureKind::ValidationError if self.status.is_some_and(|s| s.is_success()) => {
                Notification::error(self.detail.as_deref().unwrap_or(fallback))
            }
            FailureKind::ValidationError => {
                Notification::error(self.server_message().unwrap_or(fallback))
            }
            FailureKind::ServerError => Notification::error(fallback),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " ({})", status.as_u16())?;
        }
        if let Some(msg) = self.detail.as_deref().or(self.server_message()) {
            write!(f, ": {}", msg)?;
        }
        Ok(())
    }
}

/// Result of one gateway call: `Success(status, body)` or `Failure(..)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T = Value> {
    Success { status: StatusCode, body: T },
    Failure(Failure),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Outcome::Failure(f) if f.is_unauthorized())
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failure(f) => Some(f),
            Outcome::Success { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(|f| f.kind)
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Outcome::Success { body, .. } => Ok(body),
            Outcome::Failure(f) => Err(f),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success { status, body } => Outcome::Success { status, body: f(body) },
            Outcome::Failure(failure) => Outcome::Failure(failure),
        }
    }
}

impl Outcome<Value> {
    /// Run a successful body through a validation step. A rejected payload
    /// becomes `Failure(ValidationError)` carrying the original body.
    pub fn validate<U>(self, check: impl FnOnce(&Value) -> Result<U, String>) -> Outcome<U> {
        match self {
            Outcome::Success { status, body } => match check(&body) {
                Ok(parsed) => Outcome::Success { status, body: parsed },
                Err(reason) => Outcome::Failure(Failure::validation(reason, Some(status), Some(body))),
            },
            Outcome::Failure(failure) => Outcome::Failure(failure),
        }
    }

    /// Deserialize a successful body into `U`.
    pub fn parse<U: DeserializeOwned>(self) -> Outcome<U> {
        self.validate(|body| {
            <U as serde::Deserialize>::deserialize(body).map_err(|e| format!("Malformed response payload: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_failure_kind_from_status() {
        assert_eq!(FailureKind::from_status(StatusCode::OK), None);
        assert_eq!(FailureKind::from_status(StatusCode::CREATED), None);
        assert_eq!(FailureKind::from_status(StatusCode::UNAUTHORIZED), Some(FailureKind::Unauthorized));
        assert_eq!(FailureKind::from_status(StatusCode::BAD_REQUEST), Some(FailureKind::ValidationError));
        assert_eq!(FailureKind::from_status(StatusCode::FORBIDDEN), Some(FailureKind::ValidationError));
        assert_eq!(FailureKind::from_status(StatusCode::NOT_FOUND), Some(FailureKind::ValidationError));
        assert_eq!(FailureKind::from_status(StatusCode::INTERNAL_SERVER_ERROR), Some(FailureKind::ServerError));
        assert_eq!(FailureKind::from_status(StatusCode::BAD_GATEWAY), Some(FailureKind::ServerError));
        assert_eq!(FailureKind::from_status(StatusCode::NOT_MODIFIED), Some(FailureKind::ServerError));
    }

    #[test]
    fn test_validation_notification_uses_server_message() {
        let failure = Failure::from_response(
            FailureKind::ValidationError,
            StatusCode::BAD_REQUEST,
            Some(json!({"message": "name required"})),
        );
        let note = failure.notification("Failed to add category");
        assert!(note.is_error());
        assert_eq!(note.title, "Error");
        assert_eq!(note.detail, "name required");
    }

    #[test]
    fn test_validation_notification_falls_back() {
        let failure = Failure::from_response(
            FailureKind::ValidationError,
            StatusCode::BAD_REQUEST,
            Some(json!({"message": "  "})),
        );
        assert_eq!(failure.notification("Failed to add category").detail, "Failed to add category");

        let failure = Failure::from_response(FailureKind::ValidationError, StatusCode::CONFLICT, None);
        assert_eq!(failure.notification("Failed").detail, "Failed");
    }

    #[test]
    fn test_payload_validation_notification_uses_detail() {
        let failure = Failure::validation(
            "Login response missing token",
            Some(StatusCode::OK),
            Some(json!({"message": "Login successful"})),
        );
        assert_eq!(failure.notification("Something went wrong").detail, "Login response missing token");
    }

    #[test]
    fn test_server_error_notification_is_generic() {
        let failure = Failure::from_response(
            FailureKind::ServerError,
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(json!({"message": "NullPointerException at line 42"})),
        );
        assert_eq!(failure.notification("Failed to load profile").detail, "Failed to load profile");
    }

    #[test]
    fn test_unauthorized_and_network_notifications() {
        let unauthorized = Failure::from_response(FailureKind::Unauthorized, StatusCode::UNAUTHORIZED, None);
        let note = unauthorized.notification("ignored");
        assert_eq!(note.title, "Session Expired");
        assert_eq!(note.detail, "Please login again");

        let timeout = Failure::network("operation timed out", true);
        assert!(timeout.notification("x").detail.contains("timed out"));

        let refused = Failure::network("connection refused", false);
        assert!(refused.notification("x").detail.contains("Unable to connect"));
    }

    #[test]
    fn test_parse_success_body() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Profile {
            username: String,
        }

        let outcome: Outcome = Outcome::Success { status: StatusCode::OK, body: json!({"username": "a"}) };
        let parsed = outcome.parse::<Profile>();
        assert_eq!(
            parsed,
            Outcome::Success { status: StatusCode::OK, body: Profile { username: "a".to_string() } }
        );
    }

    #[test]
    fn test_parse_malformed_body_is_validation_error() {
        let outcome: Outcome = Outcome::Success { status: StatusCode::OK, body: json!({"unexpected": 1}) };
        let parsed = outcome.parse::<Vec<String>>();
        let failure = parsed.failure().cloned().unwrap();
        assert_eq!(failure.kind, FailureKind::ValidationError);
        assert_eq!(failure.status, Some(StatusCode::OK));
        assert_eq!(failure.body, Some(json!({"unexpected": 1})));
        assert!(failure.detail.unwrap().starts_with("Malformed response payload"));
    }

    #[test]
    fn test_failure_passes_through_parse() {
        let outcome: Outcome = Outcome::Failure(Failure::network("refused", false));
        let parsed = outcome.parse::<String>();
        assert_eq!(parsed.failure_kind(), Some(FailureKind::NetworkError));
    }

    #[test]
    fn test_failure_display() {
        let failure = Failure::from_response(
            FailureKind::ValidationError,
            StatusCode::BAD_REQUEST,
            Some(json!({"message": "name required"})),
        );
        assert_eq!(failure.to_string(), "ValidationError (400): name required");
    }
}
