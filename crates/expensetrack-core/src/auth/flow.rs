//! Session lifecycle: login, register, sign-out and the one place that
//! reacts to a rejected credential.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::session::{Session, SessionData};
use super::store::SessionStore;
use crate::api::{ApiClient, ApiError, Outcome};
use crate::models::{LoginCredentials, RegisterCredentials};

/// Routing capability provided by the UI layer.
pub trait Navigator: Send + Sync {
    /// Show the login/register view.
    fn to_authentication(&self);

    /// Show the main (tabbed) view.
    fn to_home(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

pub struct AuthFlow {
    api: ApiClient,
    session: Session,
    navigator: Arc<dyn Navigator>,
    state: RwLock<AuthState>,
}

impl AuthFlow {
    pub fn new(api: ApiClient, store: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            session: Session::new(store),
            navigator,
            state: RwLock::new(AuthState::Unauthenticated),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub async fn state(&self) -> AuthState {
        *self.state.read().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state().await == AuthState::Authenticated
    }

    async fn set_state(&self, state: AuthState) {
        let mut current = self.state.write().await;
        if *current != state {
            debug!(from = ?*current, to = ?state, "Auth state changed");
            *current = state;
        }
    }

    /// Pick up a persisted session at startup.
    pub async fn restore(&self) -> AuthState {
        match self.session.load() {
            Some(data) => {
                self.api.gateway().set_credential(Some(data.token)).await;
                self.set_state(AuthState::Authenticated).await;
                info!("Restored saved session");
            }
            None => {
                if self.session.has_orphaned_identity() {
                    debug!("Removing session identity left without a token");
                    if let Err(e) = self.session.clear() {
                        warn!(error = %e, "Failed to clear orphaned session data");
                    }
                }
                self.api.gateway().set_credential(None).await;
                self.set_state(AuthState::Unauthenticated).await;
            }
        }
        self.state().await
    }

    /// Log in and, on success, persist and install the credential.
    ///
    /// A failed attempt leaves an existing session untouched, unless the
    /// server answers 401, which signs out like any other call. If the
    /// session cannot be persisted the login fails with
    /// [`ApiError::SessionSave`] and nothing is left signed in.
    pub async fn login(&self, email: &str, password: &str) -> Result<Outcome<SessionData>, ApiError> {
        let previous = self.state().await;
        self.set_state(AuthState::Authenticating).await;

        let credentials = LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let outcome = match self.api.login(&credentials).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.set_state(Self::after_failed_login(previous)).await;
                return Err(e);
            }
        };

        let outcome = outcome.map(|response| SessionData {
            token: response.token().unwrap_or_default().to_string(),
            username: response.username.clone().unwrap_or_default(),
            email: response.email.clone().unwrap_or_else(|| email.to_string()),
        });

        match outcome {
            Outcome::Success { ref body, .. } => {
                if let Err(e) = self.session.save(body) {
                    error!(error = %e, "Failed to save session");
                    // Drop whatever part of the session did get written.
                    if let Err(clear_err) = self.sign_out().await {
                        warn!(error = %clear_err, "Failed to clear partially saved session");
                    }
                    return Err(ApiError::SessionSave(format!("{:#}", e)));
                }
                self.api.gateway().set_credential(Some(body.token.clone())).await;
                self.set_state(AuthState::Authenticated).await;
                info!(username = %body.username, "Login successful");
            }
            Outcome::Failure(ref failure) if failure.is_unauthorized() => {
                warn!(failure = %failure, "Login rejected with 401");
                self.handle_unauthorized().await;
            }
            Outcome::Failure(ref failure) => {
                warn!(failure = %failure, "Login failed");
                self.set_state(Self::after_failed_login(previous)).await;
            }
        }
        Ok(outcome)
    }

    fn after_failed_login(previous: AuthState) -> AuthState {
        match previous {
            AuthState::Authenticated => AuthState::Authenticated,
            _ => AuthState::Unauthenticated,
        }
    }

    /// Create an account. Does not sign in; returns the server's
    /// confirmation message.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Outcome<String>, ApiError> {
        let credentials = RegisterCredentials {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let outcome = self.guard(self.api.register(&credentials).await?).await;
        match outcome.failure() {
            Some(failure) => warn!(failure = %failure, "Registration failed"),
            None => info!("Registration successful"),
        }
        Ok(outcome.map(|response| {
            response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Registration successful".to_string())
        }))
    }

    /// Clear the stored session and the gateway credential. Safe to call
    /// when already signed out.
    pub async fn sign_out(&self) -> Result<()> {
        self.api.gateway().set_credential(None).await;
        self.set_state(AuthState::Unauthenticated).await;
        self.session.clear()
    }

    /// Pass every outcome through here. On `Unauthorized` the session is
    /// cleared and the user is sent back to authentication; all other
    /// outcomes are returned unchanged.
    pub async fn guard<T>(&self, outcome: Outcome<T>) -> Outcome<T> {
        if outcome.is_unauthorized() {
            self.handle_unauthorized().await;
        }
        outcome
    }

    async fn handle_unauthorized(&self) {
        info!("Credential rejected by server; signing out");
        if let Err(e) = self.sign_out().await {
            warn!(error = %e, "Failed to clear session after credential rejection");
        }
        self.navigator.to_authentication();
    }
}
