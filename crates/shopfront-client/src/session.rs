//! # Session Storage
//!
//! Persistent key-value storage for the signed-in session.
//!
//! ## Stored Keys
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Keys                                      │
//! │                                                                         │
//! │  token         bearer token attached to every request                  │
//! │  token_expire  expiry sent by the backend (RFC 3339 when parseable)    │
//! │  user          username; the reauthentication prompt is filled from it │
//! │  role          first role name                                         │
//! │  permissions   JSON array of permission names                          │
//! │  location      selling location name                                   │
//! │  location_id   selling location id                                     │
//! │                                                                         │
//! │  login   ──► writes all keys                                           │
//! │  reauth  ──► rewrites token + token_expire only                        │
//! │  logout  ──► removes all keys                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Session storage key names.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const TOKEN_EXPIRE: &str = "token_expire";
    pub const USER: &str = "user";
    pub const ROLE: &str = "role";
    pub const PERMISSIONS: &str = "permissions";
    pub const LOCATION: &str = "location";
    pub const LOCATION_ID: &str = "location_id";

    /// Every key written by a login.
    pub const ALL: [&str; 7] = [
        TOKEN,
        TOKEN_EXPIRE,
        USER,
        ROLE,
        PERMISSIONS,
        LOCATION,
        LOCATION_ID,
    ];
}

// =============================================================================
// Store Trait
// =============================================================================

/// String key-value store backing the session.
///
/// Calls are synchronous and short; implementations must not block on
/// anything slower than a small file write.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> ClientResult<()>;

    fn remove(&self, key: &str) -> ClientResult<()>;
}

fn lock(entries: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Session store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// Session store persisted as a JSON object, written through on every change.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Opens the store, loading existing entries if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| {
                    ClientError::Storage(format!("corrupt session file {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(?path, keys = entries.len(), "Opened session file");
        Ok(FileSessionStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut entries = lock(&self.entries);
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let mut entries = lock(&self.entries);
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }
}

// =============================================================================
// Session View
// =============================================================================

/// Typed view over a [`SessionStore`].
pub struct Session<'a> {
    store: &'a dyn SessionStore,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Session { store }
    }

    /// Stored bearer token, if any.
    pub fn bearer_token(&self) -> Option<String> {
        self.non_empty(keys::TOKEN)
    }

    /// Username of the signed-in user.
    pub fn username(&self) -> Option<String> {
        self.non_empty(keys::USER)
    }

    pub fn role(&self) -> Option<String> {
        self.non_empty(keys::ROLE)
    }

    /// Permission names; empty when absent or unreadable.
    pub fn permissions(&self) -> Vec<String> {
        self.store
            .get(keys::PERMISSIONS)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions().iter().any(|p| p == permission)
    }

    pub fn location_id(&self) -> Option<String> {
        self.non_empty(keys::LOCATION_ID)
    }

    /// Token expiry, when the backend sent a parseable timestamp.
    pub fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.store
            .get(keys::TOKEN_EXPIRE)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|at| at.with_timezone(&Utc))
    }

    /// True when a token is stored and not known to be expired at `now`.
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.bearer_token().is_some() && self.token_expiry().map_or(true, |at| at > now)
    }

    /// Saves a token issued by login or reauthentication.
    pub fn store_token(&self, access_token: &str, expires_at: Option<&str>) -> ClientResult<()> {
        self.store.set(keys::TOKEN, access_token)?;
        match expires_at {
            Some(at) => self.store.set(keys::TOKEN_EXPIRE, at),
            None => self.store.remove(keys::TOKEN_EXPIRE),
        }
    }

    /// Removes every session key.
    pub fn clear(&self) -> ClientResult<()> {
        for key in keys::ALL {
            self.store.remove(key)?;
        }
        Ok(())
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|value| !value.is_empty())
    }
}
