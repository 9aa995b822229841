//! Credential storage
//!
//! The session record is kept in a key-value store under three fixed slots:
//! `access_token`, `refresh_token` and `user` (JSON-encoded). The client only ever
//! talks to the [`SessionStore`] trait, so hosts can persist the record wherever
//! they like. Two implementations are provided:
//!
//! - [`MemorySessionStore`] - process-local, used by tests and short-lived tools
//! - [`FileSessionStore`] - a single JSON file, used by the CLI

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::warn;

use crate::token::BearerToken;
use crate::types::{Credentials, User};

/// Named slot of the session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
    User,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [
        SessionKey::AccessToken,
        SessionKey::RefreshToken,
        SessionKey::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::AccessToken => "access_token",
            SessionKey::RefreshToken => "refresh_token",
            SessionKey::User => "user",
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store lock poisoned")]
    Poisoned,

    #[error("failed to access session file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what}: {source}")]
    Malformed {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value store holding the session record.
///
/// Reads happen synchronously before every request, so implementations must be cheap
/// and must not block on the network. A missing slot is `Ok(None)`, not an error.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError>;

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: SessionKey) -> Result<(), StoreError>;

    /// Remove all three slots.
    fn clear(&self) -> Result<(), StoreError> {
        for key in SessionKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Read a token slot, validating it as a bearer token.
///
/// A value that is not a usable bearer token (e.g. an empty string) reads as absent.
pub fn read_token(
    store: &dyn SessionStore,
    key: SessionKey,
) -> Result<Option<BearerToken>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match BearerToken::try_from(raw) {
        Ok(token) => Ok(Some(token)),
        Err(error) => {
            warn!(%key, %error, "ignoring unusable stored token");
            Ok(None)
        }
    }
}

// ============================================================================
// Session record
// ============================================================================

/// A logged-in user together with their credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub credentials: Credentials,
}

impl Session {
    /// Write all three slots.
    pub fn persist(&self, store: &dyn SessionStore) -> Result<(), StoreError> {
        let user_json = serde_json::to_string(&self.user).map_err(|source| StoreError::Malformed {
            what: "user record".to_string(),
            source,
        })?;

        store.set(SessionKey::AccessToken, self.credentials.access.as_str())?;
        store.set(SessionKey::RefreshToken, self.credentials.refresh.as_str())?;
        store.set(SessionKey::User, &user_json)?;
        Ok(())
    }

    /// Load the full record. Returns `None` unless all three slots are present.
    pub fn load(store: &dyn SessionStore) -> Result<Option<Session>, StoreError> {
        let access = read_token(store, SessionKey::AccessToken)?;
        let refresh = read_token(store, SessionKey::RefreshToken)?;
        let user = load_user(store)?;

        match (access, refresh, user) {
            (Some(access), Some(refresh), Some(user)) => Ok(Some(Session {
                user,
                credentials: Credentials { access, refresh },
            })),
            _ => Ok(None),
        }
    }
}

/// Decode the `user` slot.
pub fn load_user(store: &dyn SessionStore) -> Result<Option<User>, StoreError> {
    store
        .get(SessionKey::User)?
        .map(|raw| {
            serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
                what: "stored user".to_string(),
                source,
            })
        })
        .transpose()
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: RwLock<BTreeMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        let slots = self.slots.read().map_err(|_| StoreError::Poisoned)?;
        Ok(slots.get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| StoreError::Poisoned)?;
        slots.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| StoreError::Poisoned)?;
        slots.remove(&key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| StoreError::Poisoned)?;
        slots.clear();
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

/// On-disk layout of the session file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl SessionFile {
    fn slot(&mut self, key: SessionKey) -> &mut Option<String> {
        match key {
            SessionKey::AccessToken => &mut self.access_token,
            SessionKey::RefreshToken => &mut self.refresh_token,
            SessionKey::User => &mut self.user,
        }
    }

    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

/// Session record persisted as a JSON file.
///
/// Every operation re-reads the file so that separate processes sharing the file see
/// each other's writes. The file is removed once the last slot is cleared.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_file(&self) -> Result<SessionFile, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SessionFile::default()),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            what: format!("session file {}", self.path.display()),
            source,
        })
    }

    fn write_file(&self, file: &SessionFile) -> Result<(), StoreError> {
        if file.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(self.io_error(e)),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(file).map_err(|source| StoreError::Malformed {
            what: "session record".to_string(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;

        // Tokens are credentials; keep the file private to the user.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut SessionFile)) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut file = self.read_file()?;
        f(&mut file);
        self.write_file(&file)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut file = self.read_file()?;
        Ok(file.slot(key).take())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        self.modify(|file| *file.slot(key) = Some(value.to_string()))
    }

    fn remove(&self, key: SessionKey) -> Result<(), StoreError> {
        self.modify(|file| *file.slot(key) = None)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.modify(|file| *file = SessionFile::default())
    }
}
