//! Structured key events and key-id matching.
//!
//! Hosts translate their native key events (terminal escape sequences, DOM
//! keydown, ...) into [`KeyEvent`] before handing them to the composer.
//! Key ids are lowercase `+`-joined strings such as `"ctrl+enter"`,
//! `"shift+tab"` or `"!"`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const META: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.meta
    }

    /// True when ctrl, alt or meta is held. Shift alone does not count.
    #[must_use]
    pub fn has_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    #[must_use]
    pub const fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    #[must_use]
    pub const fn char(ch: char) -> Self {
        Self::new(Key::Char(ch))
    }

    #[must_use]
    pub fn is_unmodified(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Text this key inserts under default editing, if any.
    #[must_use]
    pub fn printable(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) if !self.modifiers.has_command() && !ch.is_control() => Some(ch),
            _ => None,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&key_id(self))
    }
}

/// Normalized key id for an event, e.g. `"ctrl+shift+enter"`.
#[must_use]
pub fn key_id(event: &KeyEvent) -> String {
    let mut parts: Vec<String> = Vec::new();
    if event.modifiers.ctrl {
        parts.push("ctrl".to_string());
    }
    if event.modifiers.alt {
        parts.push("alt".to_string());
    }
    if event.modifiers.meta {
        parts.push("meta".to_string());
    }
    if event.modifiers.shift {
        parts.push("shift".to_string());
    }
    parts.push(key_name(event.key));
    parts.join("+")
}

fn key_name(key: Key) -> String {
    match key {
        Key::Char(' ') => "space".to_string(),
        Key::Char(ch) => ch.to_lowercase().collect(),
        Key::Enter => "enter".to_string(),
        Key::Escape => "escape".to_string(),
        Key::Backspace => "backspace".to_string(),
        Key::Delete => "delete".to_string(),
        Key::Tab => "tab".to_string(),
        Key::Up => "up".to_string(),
        Key::Down => "down".to_string(),
        Key::Left => "left".to_string(),
        Key::Right => "right".to_string(),
        Key::Home => "home".to_string(),
        Key::End => "end".to_string(),
    }
}

/// Parses a key id. Returns `None` for empty or unknown key names.
#[must_use]
pub fn parse_key_id(key_id: &str) -> Option<KeyEvent> {
    let lowered = key_id.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    // A literal "+" key is written as "+" or "shift++".
    let (modifier_part, key_part) = match lowered.strip_suffix("++") {
        Some(rest) => (rest, "+"),
        None if lowered == "+" => ("", "+"),
        None => match lowered.rfind('+') {
            Some(idx) => (&lowered[..idx], &lowered[idx + 1..]),
            None => ("", lowered.as_str()),
        },
    };

    let key = match key_part {
        "enter" | "return" => Key::Enter,
        "escape" | "esc" => Key::Escape,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "tab" => Key::Tab,
        "up" => Key::Up,
        "down" => Key::Down,
        "left" => Key::Left,
        "right" => Key::Right,
        "home" => Key::Home,
        "end" => Key::End,
        "space" => Key::Char(' '),
        other => {
            let mut chars = other.chars();
            let ch = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Key::Char(ch)
        }
    };

    let mut modifiers = Modifiers::NONE;
    for part in modifier_part.split('+').filter(|part| !part.is_empty()) {
        match part {
            "ctrl" | "control" => modifiers.ctrl = true,
            "alt" | "option" => modifiers.alt = true,
            "shift" => modifiers.shift = true,
            "meta" | "cmd" | "super" => modifiers.meta = true,
            _ => return None,
        }
    }

    Some(KeyEvent { key, modifiers })
}

/// Returns whether `event` is the key described by `key_id`.
///
/// Shift is ignored for character keys because the character already
/// reflects it (`"!"` matches a shifted `1` on most layouts).
#[must_use]
pub fn matches_key(event: &KeyEvent, key_id: &str) -> bool {
    let Some(expected) = parse_key_id(key_id) else {
        return false;
    };

    let same_key = match (expected.key, event.key) {
        (Key::Char(a), Key::Char(b)) => a.to_lowercase().eq(b.to_lowercase()),
        (a, b) => a == b,
    };
    if !same_key {
        return false;
    }

    let want = expected.modifiers;
    let got = event.modifiers;
    if want.ctrl != got.ctrl || want.alt != got.alt || want.meta != got.meta {
        return false;
    }
    match event.key {
        Key::Char(_) => !want.shift || got.shift,
        _ => want.shift == got.shift,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifier_combinations() {
        let parsed = parse_key_id("Ctrl+Shift+Enter").expect("valid id");
        assert_eq!(parsed.key, Key::Enter);
        assert!(parsed.modifiers.ctrl);
        assert!(parsed.modifiers.shift);
        assert!(!parsed.modifiers.alt);
    }

    #[test]
    fn parses_single_characters_and_plus() {
        assert_eq!(parse_key_id("!"), Some(KeyEvent::char('!')));
        assert_eq!(parse_key_id("+"), Some(KeyEvent::char('+')));
        assert_eq!(
            parse_key_id("ctrl++"),
            Some(KeyEvent::with_modifiers(Key::Char('+'), Modifiers::CTRL))
        );
        assert_eq!(parse_key_id("bogus"), None);
        assert_eq!(parse_key_id("hyper+a"), None);
    }

    #[test]
    fn enter_matching_respects_shift() {
        let shift_enter = KeyEvent::with_modifiers(Key::Enter, Modifiers::SHIFT);
        assert!(matches_key(&shift_enter, "shift+enter"));
        assert!(!matches_key(&shift_enter, "enter"));
        assert!(matches_key(&KeyEvent::new(Key::Enter), "return"));
    }

    #[test]
    fn char_matching_ignores_layout_shift() {
        let bang = KeyEvent::with_modifiers(Key::Char('!'), Modifiers::SHIFT);
        assert!(matches_key(&bang, "!"));
        assert!(!matches_key(&KeyEvent::char('!'), "shift+!"));
    }

    #[test]
    fn key_id_round_trips() {
        let event = KeyEvent::with_modifiers(
            Key::Enter,
            Modifiers {
                ctrl: true,
                shift: true,
                ..Modifiers::NONE
            },
        );
        assert_eq!(key_id(&event), "ctrl+shift+enter");
        assert_eq!(parse_key_id(&key_id(&event)), Some(event));
    }

    #[test]
    fn printable_excludes_command_chords() {
        assert_eq!(KeyEvent::char('a').printable(), Some('a'));
        let ctrl_a = KeyEvent::with_modifiers(Key::Char('a'), Modifiers::CTRL);
        assert_eq!(ctrl_a.printable(), None);
    }
}
