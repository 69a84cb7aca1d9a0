//! Rolling diagnostic log of auth events
//!
//! A bounded ring buffer persisted under `kickstream_auth_logs` so an
//! operator can inspect what happened across restarts. Recording never
//! fails: persistence errors are traced and dropped.

use std::collections::VecDeque;

use kickstream_domain::constants::AUTH_LOG_CAPACITY;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use super::store::SessionStore;
use super::types::AuthLogEntry;

#[derive(Debug)]
pub struct AuthLog {
    store: SessionStore,
    entries: Mutex<VecDeque<AuthLogEntry>>,
    capacity: usize,
}

impl AuthLog {
    /// Open the log, picking up previously persisted entries.
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self::with_capacity(store, AUTH_LOG_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(store: SessionStore, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries: VecDeque<AuthLogEntry> = store
            .load_logs()
            .unwrap_or_else(|err| {
                warn!(error = %err, "failed to load auth log");
                Vec::new()
            })
            .into();
        while entries.len() > capacity {
            entries.pop_front();
        }

        Self { store, entries: Mutex::new(entries), capacity }
    }

    /// Append an entry, evicting the oldest beyond capacity, and persist.
    pub fn record(&self, message: impl Into<String>, data: Option<Value>) {
        let entry = AuthLogEntry::new(message, data);
        debug!(message = %entry.message, data = ?entry.data, "auth event");

        let snapshot: Vec<AuthLogEntry> = {
            let mut entries = self.entries.lock();
            entries.push_back(entry);
            while entries.len() > self.capacity {
                entries.pop_front();
            }
            entries.iter().cloned().collect()
        };

        if let Err(err) = self.store.save_logs(&snapshot) {
            warn!(error = %err, "failed to persist auth log");
        }
    }

    /// Entries oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<AuthLogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
