use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use super::store::{SessionKey, SessionStore};

const SERVICE_NAME: &str = "expensetrack";

/// Session store backed by the OS keychain, one entry per key.
pub struct KeychainSessionStore {
    service: String,
}

impl KeychainSessionStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    fn entry(&self, key: SessionKey) -> Result<Entry> {
        Entry::new(&self.service, key.as_str()).context("Failed to create keyring entry")
    }
}

impl Default for KeychainSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for KeychainSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        let entry = match self.entry(key) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key = key.as_str(), error = %e, "Keychain unavailable");
                return None;
            }
        };
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                debug!(key = key.as_str(), error = %e, "Failed to read from keychain");
                None
            }
        }
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store value in keychain")
    }

    fn remove_many(&self, keys: &[SessionKey]) -> Result<()> {
        for key in keys {
            match self.entry(*key)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => {
                    return Err(e).context("Failed to delete credential from keychain");
                }
            }
        }
        Ok(())
    }
}
