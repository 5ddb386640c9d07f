use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::backend::{DraftBackend, DraftKey, HistoryBackend};
use crate::error::StoreError;

/// In-process store. Writes can be switched off to exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    history: Mutex<HashMap<String, Vec<String>>>,
    drafts: Mutex<HashMap<DraftKey, String>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds history for a scope, most-recent-first.
    #[must_use]
    pub fn with_history(self, scope: &str, entries: &[&str]) -> Self {
        if let Ok(mut history) = self.history.lock() {
            history.insert(
                scope.to_string(),
                entries.iter().map(|entry| (*entry).to_string()).collect(),
            );
        }
        self
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Current persisted draft, bypassing the backend trait.
    #[must_use]
    pub fn draft(&self, key: &DraftKey) -> Option<String> {
        self.drafts
            .lock()
            .ok()
            .and_then(|drafts| drafts.get(key).cloned())
    }

    fn check_writable(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable { operation });
        }
        Ok(())
    }
}

impl HistoryBackend for MemoryStore {
    fn load_history(&self, scope: &str) -> Result<Vec<String>, StoreError> {
        let history = self.history.lock().map_err(|_| StoreError::Poisoned {
            operation: "loading history",
        })?;
        Ok(history.get(scope).cloned().unwrap_or_default())
    }

    fn add_to_history(&self, scope: &str, entry: &str) -> Result<(), StoreError> {
        self.check_writable("adding history entry")?;
        let mut history = self.history.lock().map_err(|_| StoreError::Poisoned {
            operation: "adding history entry",
        })?;
        history
            .entry(scope.to_string())
            .or_default()
            .insert(0, entry.to_string());
        Ok(())
    }
}

impl DraftBackend for MemoryStore {
    fn load_draft(&self, key: &DraftKey) -> Result<Option<String>, StoreError> {
        let drafts = self.drafts.lock().map_err(|_| StoreError::Poisoned {
            operation: "loading draft",
        })?;
        Ok(drafts.get(key).cloned())
    }

    fn save_draft(&self, key: &DraftKey, text: &str) -> Result<(), StoreError> {
        self.check_writable("saving draft")?;
        let mut drafts = self.drafts.lock().map_err(|_| StoreError::Poisoned {
            operation: "saving draft",
        })?;
        if text.is_empty() {
            drafts.remove(key);
        } else {
            drafts.insert(key.clone(), text.to_string());
        }
        Ok(())
    }
}
