use thiserror::Error;

use crate::utils::truncate_string;

/// Faults that cannot be expressed as an [`Outcome`](super::Outcome).
///
/// Expected failure classes (401, 4xx, 5xx, network) are never raised as
/// errors; they come back as `Outcome::Failure`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid response from {path}: {detail}")]
    InvalidResponse { path: String, detail: String },

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The server accepted a login but the session could not be persisted.
    #[error("Failed to save session: {0}")]
    SessionSave(String),
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    pub fn invalid_response(path: &str, body: &str, cause: impl std::fmt::Display) -> Self {
        ApiError::InvalidResponse {
            path: path.to_string(),
            detail: format!(
                "{} (body: {})",
                cause,
                truncate_string(body, MAX_ERROR_BODY_LENGTH)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_response_truncates_body() {
        let body = "x".repeat(2000);
        let err = ApiError::invalid_response("/users/profile", &body, "expected value");
        let text = err.to_string();
        assert!(text.starts_with("Invalid response from /users/profile: expected value"));
        assert!(text.len() < 600);
        assert!(text.ends_with("...)"));
    }
}
