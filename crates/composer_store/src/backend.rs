use crate::error::StoreError;

/// Identifies one composer buffer: a UI instance paired with a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftKey {
    pub instance_id: String,
    pub session_id: String,
}

impl DraftKey {
    #[must_use]
    pub fn new(instance_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// Sent-prompt history, shared by every session under one scope key.
pub trait HistoryBackend: Send + Sync {
    /// Returns stored entries most-recent-first.
    fn load_history(&self, scope: &str) -> Result<Vec<String>, StoreError>;

    fn add_to_history(&self, scope: &str, entry: &str) -> Result<(), StoreError>;
}

/// Per-session unsent draft text.
pub trait DraftBackend: Send + Sync {
    fn load_draft(&self, key: &DraftKey) -> Result<Option<String>, StoreError>;

    /// Saving an empty string clears the draft.
    fn save_draft(&self, key: &DraftKey, text: &str) -> Result<(), StoreError>;
}
