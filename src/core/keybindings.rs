//! Composer keybindings.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::core::input::{matches_key, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComposerAction {
    EnterShellMode,
    ExitShellMode,
    DeleteBackward,
    DeleteForward,
    Submit,
    NewLine,
    HistoryPrevious,
    HistoryNext,
    CursorLeft,
    CursorRight,
    CursorLineStart,
    CursorLineEnd,
    SelectAll,
    PickerUp,
    PickerDown,
    PickerConfirm,
    PickerComplete,
    PickerConfirmPlain,
    PickerCancel,
}

/// Which Enter chord submits. The other one inserts a newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPreference {
    #[default]
    Enter,
    ModifierEnter,
}

pub type KeyId = String;

#[derive(Debug, Clone)]
pub enum KeyBinding {
    Single(KeyId),
    Multiple(Vec<KeyId>),
}

impl From<&str> for KeyBinding {
    fn from(value: &str) -> Self {
        KeyBinding::Single(value.to_string())
    }
}

impl From<Vec<&str>> for KeyBinding {
    fn from(value: Vec<&str>) -> Self {
        KeyBinding::Multiple(value.into_iter().map(|item| item.to_string()).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComposerKeybindingsConfig {
    entries: HashMap<ComposerAction, KeyBinding>,
}

impl ComposerKeybindingsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K: Into<KeyBinding>>(&mut self, action: ComposerAction, keys: K) {
        self.entries.insert(action, keys.into());
    }
}

// Submit and NewLine are resolved from `SubmitPreference`, not this table.
pub static DEFAULT_COMPOSER_KEYBINDINGS: Lazy<HashMap<ComposerAction, Vec<KeyId>>> =
    Lazy::new(|| {
        use ComposerAction::*;

        let keys = |ids: &[&str]| ids.iter().map(|id| id.to_string()).collect::<Vec<_>>();
        let mut map = HashMap::new();
        map.insert(EnterShellMode, keys(&["!"]));
        map.insert(ExitShellMode, keys(&["escape"]));
        map.insert(DeleteBackward, keys(&["backspace", "shift+backspace"]));
        map.insert(DeleteForward, keys(&["delete", "shift+delete", "ctrl+d"]));
        map.insert(HistoryPrevious, keys(&["up"]));
        map.insert(HistoryNext, keys(&["down"]));
        map.insert(CursorLeft, keys(&["left", "ctrl+b"]));
        map.insert(CursorRight, keys(&["right", "ctrl+f"]));
        map.insert(CursorLineStart, keys(&["home", "ctrl+a"]));
        map.insert(CursorLineEnd, keys(&["end", "ctrl+e"]));
        map.insert(SelectAll, keys(&["meta+a"]));
        map.insert(PickerUp, keys(&["up", "ctrl+p"]));
        map.insert(PickerDown, keys(&["down", "ctrl+n"]));
        map.insert(PickerConfirm, keys(&["enter"]));
        map.insert(PickerComplete, keys(&["tab"]));
        map.insert(PickerConfirmPlain, keys(&["shift+tab"]));
        map.insert(PickerCancel, keys(&["escape"]));
        map
    });

const SUBMIT_ENTER: [&str; 1] = ["enter"];
const SUBMIT_MODIFIER_ENTER: [&str; 3] = ["ctrl+enter", "meta+enter", "alt+enter"];

#[derive(Debug, Clone)]
pub struct ComposerKeybindings {
    action_to_keys: HashMap<ComposerAction, Vec<KeyId>>,
    submit_preference: SubmitPreference,
}

impl Default for ComposerKeybindings {
    fn default() -> Self {
        Self::new(ComposerKeybindingsConfig::default(), SubmitPreference::default())
    }
}

impl ComposerKeybindings {
    pub fn new(config: ComposerKeybindingsConfig, submit_preference: SubmitPreference) -> Self {
        let mut manager = Self {
            action_to_keys: HashMap::new(),
            submit_preference,
        };
        manager.build_maps(&config);
        manager
    }

    fn build_maps(&mut self, config: &ComposerKeybindingsConfig) {
        self.action_to_keys.clear();

        for (action, keys) in DEFAULT_COMPOSER_KEYBINDINGS.iter() {
            self.action_to_keys.insert(*action, keys.clone());
        }
        self.apply_submit_preference();

        for (action, binding) in config.entries.iter() {
            let key_list = match binding {
                KeyBinding::Single(key) => vec![key.clone()],
                KeyBinding::Multiple(keys) => keys.clone(),
            };
            self.action_to_keys.insert(*action, key_list);
        }
    }

    fn apply_submit_preference(&mut self) {
        let owned = |ids: &[&str]| ids.iter().map(|id| id.to_string()).collect::<Vec<_>>();
        let (submit, mut newline) = match self.submit_preference {
            SubmitPreference::Enter => (owned(&SUBMIT_ENTER), owned(&SUBMIT_MODIFIER_ENTER)),
            SubmitPreference::ModifierEnter => {
                (owned(&SUBMIT_MODIFIER_ENTER), owned(&SUBMIT_ENTER))
            }
        };
        newline.push("shift+enter".to_string());
        self.action_to_keys.insert(ComposerAction::Submit, submit);
        self.action_to_keys.insert(ComposerAction::NewLine, newline);
    }

    pub fn matches(&self, event: &KeyEvent, action: ComposerAction) -> bool {
        let keys = match self.action_to_keys.get(&action) {
            Some(keys) => keys,
            None => return false,
        };
        keys.iter().any(|key| matches_key(event, key))
    }

    pub fn get_keys(&self, action: ComposerAction) -> Vec<KeyId> {
        self.action_to_keys.get(&action).cloned().unwrap_or_default()
    }

    pub fn submit_preference(&self) -> SubmitPreference {
        self.submit_preference
    }

    pub fn set_submit_preference(&mut self, preference: SubmitPreference) {
        self.submit_preference = preference;
        self.apply_submit_preference();
    }

    pub fn set_config(&mut self, config: ComposerKeybindingsConfig) {
        self.build_maps(&config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{Key, Modifiers};

    #[test]
    fn enter_submits_by_default() {
        let kb = ComposerKeybindings::default();
        assert!(kb.matches(&KeyEvent::new(Key::Enter), ComposerAction::Submit));
        let ctrl_enter = KeyEvent::with_modifiers(Key::Enter, Modifiers::CTRL);
        assert!(kb.matches(&ctrl_enter, ComposerAction::NewLine));
    }

    #[test]
    fn modifier_preference_swaps_submit_and_newline() {
        let mut kb = ComposerKeybindings::default();
        kb.set_submit_preference(SubmitPreference::ModifierEnter);
        let meta_enter = KeyEvent::with_modifiers(Key::Enter, Modifiers::META);
        assert!(kb.matches(&meta_enter, ComposerAction::Submit));
        assert!(kb.matches(&KeyEvent::new(Key::Enter), ComposerAction::NewLine));
        assert!(!kb.matches(&KeyEvent::new(Key::Enter), ComposerAction::Submit));
    }

    #[test]
    fn config_overrides_defaults() {
        let mut config = ComposerKeybindingsConfig::new();
        config.set(ComposerAction::EnterShellMode, vec!["$", "ctrl+x"]);
        let kb = ComposerKeybindings::new(config, SubmitPreference::Enter);
        assert!(kb.matches(&KeyEvent::char('$'), ComposerAction::EnterShellMode));
        assert!(!kb.matches(&KeyEvent::char('!'), ComposerAction::EnterShellMode));
    }
}
