//! Sent-prompt history with a held draft while browsing.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use composer_store::HistoryBackend;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Conditions under which Up may start browsing history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryGate {
    pub force: bool,
    pub picker_open: bool,
    pub cursor_at_start: bool,
}

impl HistoryGate {
    #[must_use]
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }
}

/// Sent prompts for one instance. Every session of that instance reads
/// and records through the same log.
pub struct HistoryLog {
    scope: String,
    entries: Vec<String>,
    capacity: usize,
    backend: Arc<dyn HistoryBackend>,
}

pub type SharedHistory = Rc<RefCell<HistoryLog>>;

impl fmt::Debug for HistoryLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryLog")
            .field("scope", &self.scope)
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl HistoryLog {
    #[must_use]
    pub fn new(scope: impl Into<String>, capacity: usize, backend: Arc<dyn HistoryBackend>) -> Self {
        Self {
            scope: scope.into(),
            entries: Vec::new(),
            capacity: capacity.max(1),
            backend,
        }
    }

    /// Loads stored entries. A backend failure leaves history empty.
    #[must_use]
    pub fn load(scope: impl Into<String>, capacity: usize, backend: Arc<dyn HistoryBackend>) -> Self {
        let mut log = Self::new(scope, capacity, backend);
        match log.backend.load_history(&log.scope) {
            Ok(mut entries) => {
                entries.retain(|entry| !entry.trim().is_empty());
                entries.truncate(log.capacity);
                log.entries = entries;
            }
            Err(err) => {
                tracing::warn!(scope = %log.scope, error = %err, "failed to load prompt history");
            }
        }
        log
    }

    #[must_use]
    pub fn shared(self) -> SharedHistory {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds a sent prompt to the front and persists it. Persistence failures
    /// are logged; the in-memory list is updated either way.
    pub fn record(&mut self, entry: &str) {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return;
        }
        if self.entries.first().is_some_and(|latest| latest == trimmed) {
            return;
        }
        self.entries.insert(0, trimmed.to_string());
        self.entries.truncate(self.capacity);

        if let Err(err) = self.backend.add_to_history(&self.scope, trimmed) {
            tracing::warn!(scope = %self.scope, error = %err, "failed to persist history entry");
        }
    }
}

/// One session's position in a shared [`HistoryLog`], with the draft held
/// while browsing.
pub struct PromptHistory {
    log: SharedHistory,
    index: Option<usize>,
    held_draft: Option<String>,
}

impl fmt::Debug for PromptHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptHistory")
            .field("log", &*self.log.borrow())
            .field("index", &self.index)
            .finish()
    }
}

impl PromptHistory {
    #[must_use]
    pub fn new(log: SharedHistory) -> Self {
        Self {
            log,
            index: None,
            held_draft: None,
        }
    }

    #[must_use]
    pub fn log(&self) -> &SharedHistory {
        &self.log
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().entries().to_vec()
    }

    #[must_use]
    pub fn has_history(&self) -> bool {
        !self.log.borrow().is_empty()
    }

    #[must_use]
    pub fn is_browsing(&self) -> bool {
        self.index.is_some()
    }

    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Steps toward older entries. Returns the text to show, or `None` when
    /// the key should fall through to default handling.
    pub fn select_previous(&mut self, current: &str, gate: HistoryGate) -> Option<String> {
        let log = self.log.borrow();
        let len = log.entries.len();
        if len == 0 {
            return None;
        }
        let allowed =
            gate.force || (!gate.picker_open && gate.cursor_at_start) || self.index.is_some();
        if !allowed {
            return None;
        }

        let next = match self.index {
            None => {
                self.held_draft = Some(current.to_string());
                0
            }
            Some(index) => (index + 1).min(len - 1),
        };
        self.index = Some(next);
        tracing::debug!(index = next, "history: previous");
        log.entries.get(next).cloned()
    }

    /// Steps toward newer entries. Passing index 0 restores the held draft,
    /// falling back to `persisted_draft` when nothing was held.
    pub fn select_next<F>(&mut self, persisted_draft: F) -> Option<String>
    where
        F: FnOnce() -> Option<String>,
    {
        let index = self.index?;
        if index == 0 {
            self.index = None;
            tracing::debug!("history: restored draft");
            let draft = self
                .held_draft
                .take()
                .or_else(persisted_draft)
                .unwrap_or_default();
            return Some(draft);
        }
        let log = self.log.borrow();
        // Another session may have recorded since this one started browsing.
        let next = (index - 1).min(log.entries.len().saturating_sub(1));
        self.index = Some(next);
        tracing::debug!(index = next, "history: next");
        log.entries.get(next).cloned()
    }

    /// Leaves browsing mode without touching the buffer.
    pub fn stop_browsing(&mut self) {
        self.index = None;
        self.held_draft = None;
    }

    /// Records into the shared log and stops browsing.
    pub fn record(&mut self, entry: &str) {
        self.stop_browsing();
        self.log.borrow_mut().record(entry);
    }
}
