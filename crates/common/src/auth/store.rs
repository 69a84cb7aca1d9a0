//! Typed access to the persisted auth keys
//!
//! [`SessionStore`] owns the key layout (`kickstream_user`,
//! `kickstream_oauth_state`, `kickstream_code_verifier`,
//! `kickstream_return_to`, `kickstream_auth_logs`) on top of any
//! [`KeyValueStore`]. Unreadable records are treated as absent and removed.

use std::collections::HashMap;
use std::sync::Arc;

use kickstream_domain::constants::{
    STORAGE_KEY_AUTH_LOGS, STORAGE_KEY_CODE_VERIFIER, STORAGE_KEY_OAUTH_STATE,
    STORAGE_KEY_RETURN_TO, STORAGE_KEY_USER,
};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

use super::traits::KeyValueStore;
use super::types::{AuthLogEntry, PendingAuthorization, Session};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(String),

    #[error("store serialization failed: {0}")]
    Serialization(String),

    #[error("refusing to persist session: {0}")]
    InvalidSession(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Pending-login keys as found in the store. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredPending {
    pub state: Option<String>,
    pub code_verifier: Option<String>,
    pub return_to: Option<String>,
}

/// Typed wrapper over the persisted auth keys.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn load_session(&self) -> Result<Option<Session>, StoreError> {
        let Some(raw) = self.kv.get(STORAGE_KEY_USER)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.access_token.is_empty() => Ok(Some(session)),
            Ok(_) => {
                warn!("stored session has no access token; discarding");
                self.kv.remove(STORAGE_KEY_USER)?;
                Ok(None)
            }
            Err(err) => {
                warn!(error = %err, "stored session is unreadable; discarding");
                self.kv.remove(STORAGE_KEY_USER)?;
                Ok(None)
            }
        }
    }

    /// Persist the session. Sessions without an access token are rejected.
    pub fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        if session.access_token.trim().is_empty() {
            return Err(StoreError::InvalidSession("access_token is empty".into()));
        }
        let raw = serde_json::to_string(session)?;
        self.kv.set(STORAGE_KEY_USER, &raw)
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        self.kv.remove(STORAGE_KEY_USER)
    }

    /// Persist a pending login, overwriting any earlier one.
    pub fn save_pending(&self, pending: &PendingAuthorization) -> Result<(), StoreError> {
        self.kv.set(STORAGE_KEY_CODE_VERIFIER, &pending.code_verifier)?;
        self.kv.set(STORAGE_KEY_OAUTH_STATE, &pending.state)?;
        match pending.return_to.as_deref() {
            Some(route) => self.kv.set(STORAGE_KEY_RETURN_TO, route),
            None => self.kv.remove(STORAGE_KEY_RETURN_TO),
        }
    }

    pub fn load_pending(&self) -> Result<StoredPending, StoreError> {
        Ok(StoredPending {
            state: self.kv.get(STORAGE_KEY_OAUTH_STATE)?.filter(|s| !s.is_empty()),
            code_verifier: self.kv.get(STORAGE_KEY_CODE_VERIFIER)?.filter(|s| !s.is_empty()),
            return_to: self.kv.get(STORAGE_KEY_RETURN_TO)?.filter(|s| !s.is_empty()),
        })
    }

    /// Read and delete the pending login in one step.
    pub fn take_pending(&self) -> Result<StoredPending, StoreError> {
        let pending = self.load_pending()?;
        self.clear_pending()?;
        Ok(pending)
    }

    pub fn clear_pending(&self) -> Result<(), StoreError> {
        self.kv.remove(STORAGE_KEY_OAUTH_STATE)?;
        self.kv.remove(STORAGE_KEY_CODE_VERIFIER)?;
        self.kv.remove(STORAGE_KEY_RETURN_TO)
    }

    pub fn load_logs(&self) -> Result<Vec<AuthLogEntry>, StoreError> {
        let Some(raw) = self.kv.get(STORAGE_KEY_AUTH_LOGS)? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "stored auth log is unreadable; starting fresh");
            Vec::new()
        }))
    }

    pub fn save_logs(&self, entries: &[AuthLogEntry]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(entries)?;
        self.kv.set(STORAGE_KEY_AUTH_LOGS, &raw)
    }
}

/// Non-persistent [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
