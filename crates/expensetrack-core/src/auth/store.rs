//! Durable key-value storage for the credential and the session identity.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Keys persisted for a signed-in user. All three are written and cleared
/// together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    UserToken,
    UserEmail,
    Username,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [SessionKey::UserToken, SessionKey::UserEmail, SessionKey::Username];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::UserToken => "userToken",
            SessionKey::UserEmail => "userEmail",
            SessionKey::Username => "username",
        }
    }
}

/// Storage backend for the session.
///
/// `get` never fails: absence is the normal signed-out state and read
/// errors are logged and reported as absent.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Option<String>;

    fn set(&self, key: SessionKey, value: &str) -> Result<()>;

    /// Write several keys. Backends that can do so apply them in one step.
    fn set_many(&self, entries: &[(SessionKey, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(*key, value)?;
        }
        Ok(())
    }

    /// Remove keys; absent keys are ignored.
    fn remove_many(&self, keys: &[SessionKey]) -> Result<()>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<SessionKey, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values().get(&key).cloned()
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.values().insert(key, value.to_string());
        Ok(())
    }

    fn set_many(&self, entries: &[(SessionKey, &str)]) -> Result<()> {
        let mut values = self.values();
        for (key, value) in entries {
            values.insert(*key, value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[SessionKey]) -> Result<()> {
        let mut values = self.values();
        for key in keys {
            values.remove(key);
        }
        Ok(())
    }
}

/// JSON document in the cache directory.
///
/// Every mutation rewrites the whole document through a temp file and a
/// rename, so readers never observe a partial write.
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(SESSION_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        if values.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove session file")?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(values)?;

        // A leftover temp file would keep its old permissions.
        match std::fs::remove_file(&tmp) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context("Failed to remove stale session temp file"),
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp).context("Failed to create session file")?;
        file.write_all(contents.as_bytes()).context("Failed to write session file")?;
        file.sync_all().context("Failed to sync session file")?;
        drop(file);

        std::fs::rename(&tmp, &self.path).context("Failed to replace session file")?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = match self.read_all() {
            Ok(values) => values,
            Err(e) => {
                // A corrupt document is replaced rather than blocking sign-in/out.
                debug!(error = %e, "Discarding unreadable session file");
                HashMap::new()
            }
        };
        apply(&mut values);
        self.write_all(&values)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        match self.read_all() {
            Ok(mut values) => values.remove(key.as_str()),
            Err(e) => {
                debug!(key = key.as_str(), error = %e, "Failed to read session store");
                None
            }
        }
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn set_many(&self, entries: &[(SessionKey, &str)]) -> Result<()> {
        self.update(|values| {
            for (key, value) in entries {
                values.insert(key.as_str().to_string(), value.to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[SessionKey]) -> Result<()> {
        self.update(|values| {
            for key in keys {
                values.remove(key.as_str());
            }
        })
    }
}
