//! Autocomplete trigger detection for `@mention` and `/command` contexts.
//!
//! The picker re-evaluates after every buffer change. A user dismissal
//! records the trigger offset so the picker stays closed there until the
//! trigger character goes away or another trigger becomes active.

use std::collections::BTreeSet;

use crate::composer::attachment::{guess_media_type, Attachment};
use crate::core::buffer::{line_start, TextRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    Mention,
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerItem {
    File { path: String, is_directory: bool },
    Agent { name: String },
    Command { name: String, description: Option<String> },
}

impl PickerItem {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            PickerItem::File { path, .. } => path,
            PickerItem::Agent { name } | PickerItem::Command { name, .. } => name,
        }
    }
}

/// How a highlighted item is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    /// Enter: insert the token and attach.
    Select,
    /// Tab: drill into directories, otherwise behave like `Select`.
    Complete,
    /// Shift+Tab: insert the token as plain text, no attachment.
    PlainText,
}

/// Buffer edit produced by confirming a picker item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEdit {
    pub range: TextRange,
    pub replacement: String,
    pub attachment: Option<Attachment>,
    /// Directory drill-down keeps browsing.
    pub keep_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerView {
    pub mode: PickerMode,
    pub at_position: usize,
    pub search_query: String,
    pub items: Vec<PickerItem>,
    pub highlighted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PickerState {
    open: bool,
    mode: Option<PickerMode>,
    at_position: usize,
    search_query: String,
    ignored_at_positions: BTreeSet<usize>,
    items: Vec<PickerItem>,
    highlighted: usize,
}

struct Trigger {
    mode: PickerMode,
    at: usize,
    query: String,
}

impl PickerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn mode(&self) -> Option<PickerMode> {
        if self.open {
            self.mode
        } else {
            None
        }
    }

    #[must_use]
    pub fn at_position(&self) -> usize {
        self.at_position
    }

    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    #[must_use]
    pub fn ignored_at_positions(&self) -> &BTreeSet<usize> {
        &self.ignored_at_positions
    }

    #[must_use]
    pub fn items(&self) -> &[PickerItem] {
        &self.items
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<&PickerItem> {
        self.items.get(self.highlighted)
    }

    #[must_use]
    pub fn view(&self) -> Option<PickerView> {
        let mode = self.mode()?;
        Some(PickerView {
            mode,
            at_position: self.at_position,
            search_query: self.search_query.clone(),
            items: self.items.clone(),
            highlighted: self.highlighted,
        })
    }

    /// Re-evaluates triggers for the current buffer and selection.
    ///
    /// Returns true when the picker opened, moved to another trigger or
    /// changed query, i.e. when candidates need refreshing.
    pub fn evaluate(&mut self, buffer: &str, selection: TextRange, shell_mode: bool) -> bool {
        self.prune_ignored(buffer);

        let trigger = if selection.is_collapsed() {
            detect_trigger(buffer, selection.end, shell_mode)
        } else {
            None
        };

        let Some(trigger) = trigger else {
            self.close();
            return false;
        };

        if self.ignored_at_positions.contains(&trigger.at) {
            self.close();
            return false;
        }

        let changed = !self.open
            || self.mode != Some(trigger.mode)
            || self.at_position != trigger.at
            || self.search_query != trigger.query;

        if !self.open || self.at_position != trigger.at {
            // A new trigger offset is active; earlier dismissals no longer apply.
            self.ignored_at_positions.clear();
            tracing::debug!(at = trigger.at, mode = ?trigger.mode, "picker opened");
        }

        self.open = true;
        self.mode = Some(trigger.mode);
        self.at_position = trigger.at;
        if changed {
            self.search_query = trigger.query;
            self.highlighted = 0;
        }
        changed
    }

    /// Replaces candidates, keeping the highlight in range.
    pub fn set_items(&mut self, items: Vec<PickerItem>) {
        self.items = items;
        if self.highlighted >= self.items.len() {
            self.highlighted = 0;
        }
    }

    pub fn move_highlight(&mut self, delta: isize) {
        let len = self.items.len();
        if len == 0 {
            self.highlighted = 0;
            return;
        }
        let current = self.highlighted as isize;
        self.highlighted = (current + delta).rem_euclid(len as isize) as usize;
    }

    /// Returns false when `index` is past the candidates.
    pub fn set_highlighted(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.highlighted = index;
        true
    }

    /// User dismissal. The trigger offset is ignored until it changes.
    pub fn dismiss(&mut self) {
        if !self.open {
            return;
        }
        self.ignored_at_positions.insert(self.at_position);
        tracing::debug!(at = self.at_position, "picker dismissed");
        self.close();
    }

    /// Closes without remembering the offset.
    pub fn close(&mut self) {
        if self.open {
            tracing::debug!(at = self.at_position, "picker closed");
        }
        self.open = false;
        self.mode = None;
        self.search_query.clear();
        self.items.clear();
        self.highlighted = 0;
    }

    pub fn reset(&mut self) {
        self.close();
        self.ignored_at_positions.clear();
    }

    fn prune_ignored(&mut self, buffer: &str) {
        self.ignored_at_positions.retain(|&offset| {
            matches!(buffer.get(offset..).and_then(|rest| rest.chars().next()), Some('@' | '/'))
        });
    }

    /// Edit for confirming `item` with the cursor at `cursor`.
    #[must_use]
    pub fn confirm_edit(&self, item: &PickerItem, cursor: usize, confirm: Confirm) -> Option<PickerEdit> {
        if !self.open {
            return None;
        }
        let span = TextRange::new(self.at_position, cursor);

        let edit = match item {
            PickerItem::Command { name, .. } => PickerEdit {
                range: span,
                replacement: format!("/{name} "),
                attachment: None,
                keep_open: false,
            },
            PickerItem::Agent { name } => PickerEdit {
                range: span,
                replacement: format!("@{name} "),
                attachment: (confirm != Confirm::PlainText).then(|| Attachment::agent(name.clone())),
                keep_open: false,
            },
            PickerItem::File { path, is_directory } => {
                let dir_path = if *is_directory && !path.ends_with('/') {
                    format!("{path}/")
                } else {
                    path.clone()
                };
                if *is_directory && confirm == Confirm::Complete {
                    // Only the query after `@` changes so browsing continues.
                    PickerEdit {
                        range: TextRange::new(self.at_position + 1, cursor),
                        replacement: dir_path,
                        attachment: None,
                        keep_open: true,
                    }
                } else {
                    let attachment = (confirm != Confirm::PlainText)
                        .then(|| Attachment::file(dir_path.clone(), guess_media_type(&dir_path)));
                    PickerEdit {
                        range: span,
                        replacement: format!("@{dir_path} "),
                        attachment,
                        keep_open: false,
                    }
                }
            }
        };
        Some(edit)
    }
}

fn detect_trigger(buffer: &str, cursor: usize, shell_mode: bool) -> Option<Trigger> {
    if cursor > buffer.len() || !buffer.is_char_boundary(cursor) {
        return None;
    }

    if !shell_mode && buffer.starts_with('/') {
        let token_end = buffer
            .find(char::is_whitespace)
            .unwrap_or(buffer.len());
        if cursor >= 1 && cursor <= token_end {
            return Some(Trigger {
                mode: PickerMode::Command,
                at: 0,
                query: buffer[1..cursor].to_string(),
            });
        }
        // Past the command token, mentions may still trigger below.
    }

    let line = line_start(buffer, cursor);
    let at = line + buffer[line..cursor].rfind('@')?;
    let query = &buffer[at + 1..cursor];
    if query.chars().any(char::is_whitespace) {
        return None;
    }
    let at_token_start = buffer[..at]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace);
    if !at_token_start {
        return None;
    }
    let at_run_end = buffer[cursor..]
        .chars()
        .next()
        .map_or(true, char::is_whitespace);
    if !at_run_end {
        return None;
    }

    Some(Trigger {
        mode: PickerMode::Mention,
        at,
        query: query.to_string(),
    })
}
