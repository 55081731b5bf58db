use std::sync::Arc;

use anyhow::Result;

use super::store::{SessionKey, SessionStore};

/// The credential plus the display identity bound to it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionData {
    pub token: String,
    pub username: String,
    pub email: String,
}

impl std::fmt::Debug for SessionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionData")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}

/// Typed view over a [`SessionStore`].
///
/// A token is what makes a session; username/email without one are
/// leftovers and count as signed out.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Load the persisted session, if a non-empty token exists.
    pub fn load(&self) -> Option<SessionData> {
        let token = self.store.get(SessionKey::UserToken).filter(|t| !t.is_empty())?;
        Some(SessionData {
            token,
            username: self.store.get(SessionKey::Username).unwrap_or_default(),
            email: self.store.get(SessionKey::UserEmail).unwrap_or_default(),
        })
    }

    /// Get the bearer token if one is stored
    pub fn token(&self) -> Option<String> {
        self.store.get(SessionKey::UserToken).filter(|t| !t.is_empty())
    }

    /// Identity fields present without a token.
    pub fn has_orphaned_identity(&self) -> bool {
        self.token().is_none()
            && (self.store.get(SessionKey::Username).is_some()
                || self.store.get(SessionKey::UserEmail).is_some())
    }

    pub fn save(&self, data: &SessionData) -> Result<()> {
        self.store.set_many(&[
            (SessionKey::UserToken, data.token.as_str()),
            (SessionKey::UserEmail, data.email.as_str()),
            (SessionKey::Username, data.username.as_str()),
        ])
    }

    /// Remove the credential and identity together.
    pub fn clear(&self) -> Result<()> {
        self.store.remove_many(&SessionKey::ALL)
    }
}
