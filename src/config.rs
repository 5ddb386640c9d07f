//! Environment configuration.

use std::env;
use std::path::PathBuf;

use crate::composer::history::DEFAULT_HISTORY_CAPACITY;

pub const DEFAULT_PASTE_MIN_CHARS: usize = 150;
pub const DEFAULT_PASTE_MIN_LINES: usize = 5;
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Modifier+Enter submits and plain Enter inserts a newline.
    pub submit_with_modifier: bool,
    pub history_limit: usize,
    /// Pastes longer than this many characters become a placeholder.
    pub paste_min_chars: usize,
    /// Pastes with at least this many lines become a placeholder.
    pub paste_min_lines: usize,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
    pub store_dir: Option<PathBuf>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            submit_with_modifier: false,
            history_limit: DEFAULT_HISTORY_CAPACITY,
            paste_min_chars: DEFAULT_PASTE_MIN_CHARS,
            paste_min_lines: DEFAULT_PASTE_MIN_LINES,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_file: None,
            store_dir: None,
        }
    }
}

impl ComposerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            submit_with_modifier: env_flag("PROMPT_COMPOSER_SUBMIT_WITH_MODIFIER"),
            history_limit: env_usize("PROMPT_COMPOSER_HISTORY_LIMIT")
                .unwrap_or(defaults.history_limit)
                .max(1),
            paste_min_chars: env_usize("PROMPT_COMPOSER_PASTE_MIN_CHARS")
                .unwrap_or(defaults.paste_min_chars),
            paste_min_lines: env_usize("PROMPT_COMPOSER_PASTE_MIN_LINES")
                .unwrap_or(defaults.paste_min_lines),
            log_filter: env_string_opt("PROMPT_COMPOSER_LOG").unwrap_or(defaults.log_filter),
            log_file: env_string_opt("PROMPT_COMPOSER_LOG_FILE").map(PathBuf::from),
            store_dir: env_string_opt("PROMPT_COMPOSER_STORE_DIR").map(PathBuf::from),
        }
    }

    /// Whether a paste should be replaced by a `[pasted #N]` placeholder.
    #[must_use]
    pub fn is_large_paste(&self, text: &str) -> bool {
        text.chars().count() > self.paste_min_chars
            || text.split('\n').count() >= self.paste_min_lines
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_usize(key: &str) -> Option<usize> {
    env_string_opt(key).and_then(|value| value.trim().parse().ok())
}
