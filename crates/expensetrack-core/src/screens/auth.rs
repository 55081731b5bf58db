use std::sync::Arc;

use tracing::debug;

use crate::api::{ApiError, Outcome};
use crate::auth::AuthFlow;
use crate::notification::Notification;

const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Clone, Default)]
pub struct AuthForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AuthForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"****")
            .finish()
    }
}

/// Login/register view.
pub struct AuthScreen {
    flow: Arc<AuthFlow>,
    pub mode: AuthMode,
    pub form: AuthForm,
    pub notification: Option<Notification>,
}

impl AuthScreen {
    pub fn new(flow: Arc<AuthFlow>) -> Self {
        Self {
            flow,
            mode: AuthMode::default(),
            form: AuthForm::default(),
            notification: None,
        }
    }

    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
        self.notification = None;
    }

    /// Submit the form for the current mode.
    pub async fn submit(&mut self) -> Result<(), ApiError> {
        debug!(mode = ?self.mode, form = ?self.form, "Submitting auth form");
        match self.mode {
            AuthMode::Register => self.submit_register().await,
            AuthMode::Login => self.submit_login().await,
        }
    }

    async fn submit_register(&mut self) -> Result<(), ApiError> {
        let AuthForm { username, email, password } = &self.form;
        if username.is_empty() || email.is_empty() || password.is_empty() {
            self.notification = Some(Notification::error("Please fill in all fields"));
            return Ok(());
        }

        match self.flow.register(username, email, password).await? {
            Outcome::Success { body: message, .. } => {
                self.notification = Some(Notification::success(message));
                self.mode = AuthMode::Login;
                self.form.password.clear();
            }
            Outcome::Failure(failure) => {
                self.notification = Some(failure.notification(GENERIC_FAILURE));
            }
        }
        Ok(())
    }

    async fn submit_login(&mut self) -> Result<(), ApiError> {
        if self.form.email.is_empty() || self.form.password.is_empty() {
            self.notification = Some(Notification::error("Please enter email and password"));
            return Ok(());
        }

        let outcome = match self.flow.login(&self.form.email, &self.form.password).await {
            Ok(outcome) => outcome,
            Err(ApiError::SessionSave(detail)) => {
                debug!(%detail, "Login succeeded but session was not saved");
                self.notification = Some(Notification::error("Could not save your session. Please try again."));
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        match outcome {
            Outcome::Success { .. } => {
                self.notification = Some(Notification::success("Login successful"));
                self.form.password.clear();
                self.flow.navigator().to_home();
            }
            Outcome::Failure(failure) => {
                self.notification = Some(failure.notification(GENERIC_FAILURE));
            }
        }
        Ok(())
    }
}
