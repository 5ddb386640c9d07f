//! Session-scoped composer state.
//!
//! Each (instance, session) pair owns one [`SessionContext`]. The registry
//! creates it on open, drops it on close and tracks which one is active.

use std::collections::HashMap;

use composer_store::{DraftBackend, DraftKey};

use crate::composer::error::{ComposerAlert, ComposerError};
use crate::composer::history::{PromptHistory, SharedHistory};
use crate::composer::ledger::AttachmentLedger;
use crate::composer::picker::PickerState;
use crate::composer::placeholder::Counters;
use crate::composer::ComposerMode;
use crate::core::buffer::{
    clamp_to_boundary, line_end, line_start, next_grapheme_boundary, prev_grapheme_boundary,
    splice, vertical_move, TextRange,
};

pub type SessionKey = DraftKey;

#[derive(Debug)]
pub struct SessionContext {
    pub(crate) key: SessionKey,
    pub(crate) buffer: String,
    pub(crate) selection: TextRange,
    pub(crate) mode: ComposerMode,
    pub(crate) ledger: AttachmentLedger,
    pub(crate) picker: PickerState,
    pub(crate) history: PromptHistory,
    /// Counters ever handed out, so removal never frees a number.
    pub(crate) issued: Counters,
    pub(crate) saved_draft: String,
    pub(crate) focused: bool,
    pub(crate) sending: bool,
    pub(crate) alert: Option<ComposerAlert>,
}

impl SessionContext {
    /// Loads the persisted draft and joins the instance's history. A draft
    /// backend failure is logged and the session starts empty.
    #[must_use]
    pub fn open(key: SessionKey, history: SharedHistory, drafts: &dyn DraftBackend) -> Self {
        let draft = match drafts.load_draft(&key) {
            Ok(draft) => draft.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(
                    instance = %key.instance_id,
                    session = %key.session_id,
                    error = %err,
                    "failed to load draft"
                );
                String::new()
            }
        };
        let history = PromptHistory::new(history);

        Self {
            selection: TextRange::collapsed(draft.len()),
            saved_draft: draft.clone(),
            buffer: draft,
            key,
            mode: ComposerMode::Normal,
            ledger: AttachmentLedger::new(),
            picker: PickerState::new(),
            history,
            issued: Counters::default(),
            focused: false,
            sending: false,
            alert: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn selection(&self) -> TextRange {
        self.selection
    }

    #[must_use]
    pub fn mode(&self) -> ComposerMode {
        self.mode
    }

    #[must_use]
    pub fn ledger(&self) -> &AttachmentLedger {
        &self.ledger
    }

    #[must_use]
    pub fn picker(&self) -> &PickerState {
        &self.picker
    }

    #[must_use]
    pub fn history(&self) -> &PromptHistory {
        &self.history
    }

    #[must_use]
    pub fn can_send(&self) -> bool {
        !self.sending && (!self.buffer.trim().is_empty() || !self.ledger.is_empty())
    }
}

// Buffer primitives. Callers run the post-mutation pass afterwards.
impl SessionContext {
    pub(crate) fn replace_range(&mut self, range: TextRange, text: &str) {
        let end = splice(&mut self.buffer, range, text);
        self.selection = TextRange::collapsed(end);
    }

    pub(crate) fn replace_selection(&mut self, text: &str) {
        self.replace_range(self.selection, text);
    }

    pub(crate) fn set_buffer(&mut self, text: String) {
        self.selection = TextRange::collapsed(text.len());
        self.buffer = text;
    }

    pub(crate) fn delete_backward(&mut self) -> bool {
        if !self.selection.is_collapsed() {
            self.replace_selection("");
            return true;
        }
        let cursor = self.selection.end;
        if cursor == 0 {
            return false;
        }
        let start = prev_grapheme_boundary(&self.buffer, cursor);
        self.replace_range(TextRange::new(start, cursor), "");
        true
    }

    pub(crate) fn delete_forward(&mut self) -> bool {
        if !self.selection.is_collapsed() {
            self.replace_selection("");
            return true;
        }
        let cursor = self.selection.end;
        if cursor >= self.buffer.len() {
            return false;
        }
        let end = next_grapheme_boundary(&self.buffer, cursor);
        self.replace_range(TextRange::new(cursor, end), "");
        true
    }

    pub(crate) fn move_to(&mut self, offset: usize) {
        self.selection = TextRange::collapsed(clamp_to_boundary(&self.buffer, offset));
    }

    pub(crate) fn move_left(&mut self) {
        let target = if self.selection.is_collapsed() {
            prev_grapheme_boundary(&self.buffer, self.selection.start)
        } else {
            self.selection.start
        };
        self.move_to(target);
    }

    pub(crate) fn move_right(&mut self) {
        let target = if self.selection.is_collapsed() {
            next_grapheme_boundary(&self.buffer, self.selection.end)
        } else {
            self.selection.end
        };
        self.move_to(target);
    }

    pub(crate) fn move_line_start(&mut self) {
        self.move_to(line_start(&self.buffer, self.selection.start));
    }

    pub(crate) fn move_line_end(&mut self) {
        self.move_to(line_end(&self.buffer, self.selection.end));
    }

    /// Returns false when there is no line in that direction.
    pub(crate) fn move_vertical(&mut self, direction: isize) -> bool {
        match vertical_move(&self.buffer, self.selection.end, direction) {
            Some(offset) => {
                self.move_to(offset);
                true
            }
            None => false,
        }
    }

    pub(crate) fn select_all(&mut self) {
        self.selection = TextRange::new(0, self.buffer.len());
    }

    /// A space when the cursor follows a non-whitespace character, so an
    /// inserted `@mention` starts its own token.
    pub(crate) fn token_gap(&self) -> &'static str {
        match self.buffer[..clamp_to_boundary(&self.buffer, self.selection.start)]
            .chars()
            .next_back()
        {
            Some(ch) if !ch.is_whitespace() => " ",
            _ => "",
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionKey, SessionContext>,
    active: Option<SessionKey>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    /// Inserts `context` unless its key is already open, and activates it.
    pub fn insert(&mut self, context: SessionContext) {
        let key = context.key.clone();
        self.sessions.entry(key.clone()).or_insert(context);
        self.active = Some(key);
    }

    pub fn remove(&mut self, key: &SessionKey) -> Option<SessionContext> {
        let removed = self.sessions.remove(key)?;
        if self.active.as_ref() == Some(key) {
            self.active = None;
        }
        Some(removed)
    }

    pub fn activate(&mut self, key: &SessionKey) -> Result<(), ComposerError> {
        if !self.sessions.contains_key(key) {
            return Err(ComposerError::UnknownSession(key.clone()));
        }
        self.active = Some(key.clone());
        Ok(())
    }

    #[must_use]
    pub fn active_key(&self) -> Option<&SessionKey> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Result<&SessionContext, ComposerError> {
        self.active
            .as_ref()
            .and_then(|key| self.sessions.get(key))
            .ok_or(ComposerError::NoActiveSession)
    }

    pub fn active_mut(&mut self) -> Result<&mut SessionContext, ComposerError> {
        let key = self.active.as_ref().ok_or(ComposerError::NoActiveSession)?;
        self.sessions
            .get_mut(key)
            .ok_or(ComposerError::NoActiveSession)
    }

    pub fn get_mut(&mut self, key: &SessionKey) -> Result<&mut SessionContext, ComposerError> {
        self.sessions
            .get_mut(key)
            .ok_or_else(|| ComposerError::UnknownSession(key.clone()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::history::HistoryLog;
    use composer_store::MemoryStore;
    use std::sync::Arc;

    fn open(store: &Arc<MemoryStore>, session: &str) -> SessionContext {
        let log = HistoryLog::load("inst", 100, store.clone()).shared();
        SessionContext::open(SessionKey::new("inst", session), log, store.as_ref())
    }

    #[test]
    fn open_restores_draft_with_cursor_at_end() {
        let store = Arc::new(MemoryStore::new().with_history("inst", &["earlier"]));
        store
            .save_draft(&SessionKey::new("inst", "s1"), "half done")
            .expect("save");
        let context = open(&store, "s1");
        assert_eq!(context.buffer(), "half done");
        assert_eq!(context.selection(), TextRange::collapsed(9));
        assert!(context.history().has_history());
        assert!(context.can_send());
    }

    #[test]
    fn grapheme_editing_primitives() {
        let store = Arc::new(MemoryStore::new());
        let mut context = open(&store, "s1");
        context.replace_selection("ae\u{301}");
        assert!(context.delete_backward());
        assert_eq!(context.buffer(), "a");
        context.move_left();
        assert!(!context.delete_backward());
        assert!(context.delete_forward());
        assert_eq!(context.buffer(), "");

        context.set_buffer("one\ntwo".to_string());
        context.move_line_start();
        assert_eq!(context.selection(), TextRange::collapsed(4));
        assert!(context.move_vertical(-1));
        assert_eq!(context.selection(), TextRange::collapsed(0));
        assert!(!context.move_vertical(-1));
        assert_eq!(context.token_gap(), "");
        context.move_line_end();
        assert_eq!(context.token_gap(), " ");

        context.select_all();
        assert!(context.delete_backward());
        assert_eq!(context.buffer(), "");
    }

    #[test]
    fn registry_tracks_active_session() {
        let store = Arc::new(MemoryStore::new());
        let mut registry = SessionRegistry::new();
        assert!(matches!(registry.active(), Err(ComposerError::NoActiveSession)));

        registry.insert(open(&store, "s1"));
        registry.insert(open(&store, "s2"));
        assert_eq!(registry.active_key(), Some(&SessionKey::new("inst", "s2")));

        registry.activate(&SessionKey::new("inst", "s1")).expect("open");
        assert!(matches!(
            registry.activate(&SessionKey::new("inst", "missing")),
            Err(ComposerError::UnknownSession(_))
        ));

        registry.remove(&SessionKey::new("inst", "s1"));
        assert!(registry.active_key().is_none());
        assert_eq!(registry.len(), 1);
    }
}
