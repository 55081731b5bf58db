use std::sync::Arc;

use tracing::error;

use super::require_session;
use crate::api::{ApiError, Outcome};
use crate::auth::AuthFlow;
use crate::models::UserProfile;
use crate::notification::Notification;

pub struct ProfileScreen {
    flow: Arc<AuthFlow>,
    pub profile: Option<UserProfile>,
    pub loading: bool,
    pub notification: Option<Notification>,
}

impl ProfileScreen {
    pub fn new(flow: Arc<AuthFlow>) -> Self {
        Self {
            flow,
            profile: None,
            loading: true,
            notification: None,
        }
    }

    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.loading = true;
        let result = self.fetch().await;
        self.loading = false;
        result
    }

    async fn fetch(&mut self) -> Result<(), ApiError> {
        if let Err(note) = require_session(&self.flow).await {
            self.notification = Some(note);
            return Ok(());
        }

        let outcome = self.flow.api().profile().await?;
        match self.flow.guard(outcome).await {
            Outcome::Success { body, .. } => self.profile = Some(body),
            Outcome::Failure(failure) => {
                self.notification = Some(failure.notification("Failed to load profile"));
            }
        }
        Ok(())
    }

    /// Clear the session and return to authentication.
    pub async fn sign_out(&mut self) {
        match self.flow.sign_out().await {
            Ok(()) => {
                self.profile = None;
                self.notification = Some(Notification::success("Signed out successfully"));
                self.flow.navigator().to_authentication();
            }
            Err(e) => {
                error!(error = %e, "Sign out failed");
                self.notification = Some(Notification::error("Failed to sign out"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::AuthState;
    use crate::testutil::{MockServer, TestHarness};

    async fn signed_in(server: &MockServer) -> TestHarness {
        server.respond("POST", "/users/login", 200, json!({"token": "abc", "username": "a", "email": "a@b.com"}));
        let h = TestHarness::new(server);
        h.flow.login("a@b.com", "x").await.unwrap();
        h
    }

    #[tokio::test]
    async fn test_load_profile() {
        let server = MockServer::start().await;
        server.respond("GET", "/users/profile", 200, json!({"username": "alice", "email": "a@b.com"}));
        let h = signed_in(&server).await;

        let mut screen = ProfileScreen::new(h.flow.clone());
        screen.load().await.unwrap();

        assert!(!screen.loading);
        let profile = screen.profile.unwrap();
        assert_eq!(profile.display_name(), "alice");
        assert_eq!(profile.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_load_server_error_uses_fallback() {
        let server = MockServer::start().await;
        server.respond("GET", "/users/profile", 500, json!({"message": "stack trace"}));
        let h = signed_in(&server).await;

        let mut screen = ProfileScreen::new(h.flow.clone());
        screen.load().await.unwrap();

        assert_eq!(screen.notification, Some(Notification::error("Failed to load profile")));
        assert!(screen.profile.is_none());
        assert_eq!(h.flow.state().await, AuthState::Authenticated);
    }

    #[tokio::test]
    async fn test_load_unauthorized_returns_to_login() {
        let server = MockServer::start().await;
        server.respond("GET", "/users/profile", 401, json!({"message": "invalid token"}));
        let h = signed_in(&server).await;

        let mut screen = ProfileScreen::new(h.flow.clone());
        screen.load().await.unwrap();

        assert_eq!(screen.notification.unwrap().title, "Session Expired");
        assert!(h.store.is_empty());
        assert_eq!(h.navigator.events(), vec!["authentication"]);
    }

    #[tokio::test]
    async fn test_sign_out() {
        let server = MockServer::start().await;
        let h = signed_in(&server).await;

        let mut screen = ProfileScreen::new(h.flow.clone());
        screen.sign_out().await;

        assert_eq!(screen.notification, Some(Notification::success("Signed out successfully")));
        assert_eq!(h.flow.state().await, AuthState::Unauthenticated);
        assert!(h.store.is_empty());
        assert!(!h.gateway.has_credential().await);
        assert_eq!(h.navigator.events(), vec!["authentication"]);
    }
}
