use serde::{Deserialize, Serialize};

/// Body returned by both `/users/login` and `/users/register`.
///
/// Register answers with a `message` only; login adds the token and the
/// identity fields.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthResponse {
    /// The token, if the server sent a non-empty one.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("message", &self.message)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"****")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RegisterCredentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCredentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"****")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"message":"Login successful","token":"abc","username":"a","email":"a@b.com"}"#;
        let resp: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.token(), Some("abc"));
        assert_eq!(resp.username.as_deref(), Some("a"));
    }

    #[test]
    fn test_parse_register_response_without_token() {
        let resp: AuthResponse = serde_json::from_str(r#"{"message":"registered"}"#).unwrap();
        assert_eq!(resp.message.as_deref(), Some("registered"));
        assert_eq!(resp.token(), None);
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let resp: AuthResponse = serde_json::from_str(r#"{"token":""}"#).unwrap();
        assert_eq!(resp.token(), None);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let resp = AuthResponse { token: Some("abc123".to_string()), ..Default::default() };
        assert!(!format!("{:?}", resp).contains("abc123"));

        let creds = LoginCredentials { email: "a@b.com".to_string(), password: "hunter2".to_string() };
        let text = format!("{:?}", creds);
        assert!(text.contains("a@b.com"));
        assert!(!text.contains("hunter2"));
    }
}
