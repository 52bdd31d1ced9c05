//! Session persistence.
//!
//! # Design
//! `SessionStore` keeps the bearer token and the user profile as two named
//! entries in an injected `KeyValueStore`. Two backends ship with the crate:
//! `MemoryStore` for tests and short-lived processes, and `FileStore`, a JSON
//! file that survives restarts.
//!
//! Reads fail soft: a missing or unreadable entry is an absent session.
//! Writes replace both entries together, and reads take both from one
//! backend read. A profile without a token is no session.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::UserProfile;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("session data could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("refusing to save a session without a token")]
    EmptyToken,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// String key-value capability the session is persisted in.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;

    /// Read several entries. Backends that can should do it in one read, so
    /// the values come from the same write.
    fn get_entries(&self, keys: &[&str]) -> Vec<Option<String>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Write several entries. Backends that can should do it in one write.
    fn set_entries(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several entries. Backends that can should do it in one write.
    fn remove_entries(&self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &self.entries.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn get_entries(&self, keys: &[&str]) -> Vec<Option<String>> {
        let map = self.entries.read();
        keys.iter().map(|key| map.get(*key).cloned()).collect()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn set_entries(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_entries(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut map = self.entries.write();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// Entries kept in a single JSON object on disk.
///
/// Every write rewrites the whole file through a sibling temp file and a
/// rename. An unreadable file reads as empty and is replaced on the next
/// write.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session file unreadable");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "session file is not valid JSON");
            BTreeMap::new()
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries();
        apply(&mut entries);
        self.write_entries(&entries)
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore").field("path", &self.path).finish()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock();
        self.read_entries().remove(key)
    }

    fn get_entries(&self, keys: &[&str]) -> Vec<Option<String>> {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries();
        keys.iter().map(|key| entries.remove(*key)).collect()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn set_entries(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_entries(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

/// A token and the profile it was issued for.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: Option<UserProfile>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Token and profile persistence over a `KeyValueStore`.
///
/// Cheap to clone; clones share the same backend.
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(path)))
    }

    /// Persist a session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// `EmptyToken` (nothing is written) when `token` is empty or blank;
    /// `Store` when the backend fails.
    pub fn save(&self, token: &str, user: &UserProfile) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            warn!("attempted to save a session with an empty token");
            return Err(SessionError::EmptyToken);
        }
        let user_json = serde_json::to_string(user).map_err(StoreError::from)?;
        self.store
            .set_entries(&[(TOKEN_KEY, token), (USER_KEY, &user_json)])?;
        debug!(email = %user.email, "session saved");
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// The stored profile, only while a token is stored. Unparseable data
    /// is treated as absent.
    pub fn user(&self) -> Option<UserProfile> {
        self.load()?.user
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Token and profile taken from a single backend read.
    pub fn load(&self) -> Option<Session> {
        let mut entries = self.store.get_entries(&[TOKEN_KEY, USER_KEY]).into_iter();
        let token = entries.next().flatten().filter(|token| !token.is_empty())?;
        let user = entries.next().flatten().and_then(|raw| {
            serde_json::from_str(&raw)
                .inspect_err(|e| warn!(error = %e, "stored user profile is unreadable; ignoring it"))
                .ok()
        });
        Some(Session { token, user })
    }

    /// Remove token and profile. Clearing an empty store is a no-op.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.remove_entries(&[TOKEN_KEY, USER_KEY])?;
        debug!("session cleared");
        Ok(())
    }
}
