//! Placeholder and mention grammar.
//!
//! Two bracket grammars stand in for attachment content: `[pasted #N]` for
//! large text pastes and `[Image #N]` for images. Mentions are `@name` runs
//! that begin a whitespace-delimited token. Matching is anchored to the full
//! token shape; a partially deleted bracket never matches.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::composer::attachment::{Attachment, AttachmentKind};
use crate::core::buffer::TextRange;

static PASTED_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[pasted #(\d+)\]").expect("valid pasted token pattern"));
static IMAGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[Image #(\d+)\]").expect("valid image token pattern"));
static PASTED_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^pasted #(\d+)\b").expect("valid pasted label pattern"));
static IMAGE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Image #(\d+)\b").expect("valid image label pattern"));
static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(@[^\s@]+)").expect("valid mention pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Pasted,
    Image,
}

#[must_use]
pub fn format_pasted(counter: u32) -> String {
    format!("[pasted #{counter}]")
}

#[must_use]
pub fn format_image(counter: u32) -> String {
    format!("[Image #{counter}]")
}

#[must_use]
pub fn format_mention(name: &str) -> String {
    format!("@{name}")
}

#[must_use]
pub fn pasted_label(counter: u32, line_count: usize) -> String {
    let unit = if line_count == 1 { "line" } else { "lines" };
    format!("pasted #{counter} ({line_count} {unit})")
}

#[must_use]
pub fn image_label(counter: u32) -> String {
    format!("Image #{counter}")
}

/// Counter embedded at the start of a display label.
#[must_use]
pub fn label_counter(display: &str) -> Option<(CounterKind, u32)> {
    if let Some(caps) = PASTED_LABEL.captures(display) {
        return caps[1].parse().ok().map(|n| (CounterKind::Pasted, n));
    }
    if let Some(caps) = IMAGE_LABEL.captures(display) {
        return caps[1].parse().ok().map(|n| (CounterKind::Image, n));
    }
    None
}

/// Highest counters seen so far, from both the buffer and the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub highest_paste: u32,
    pub highest_image: u32,
}

impl Counters {
    #[must_use]
    pub fn next_paste(&self) -> u32 {
        self.highest_paste.saturating_add(1)
    }

    #[must_use]
    pub fn next_image(&self) -> u32 {
        self.highest_image.saturating_add(1)
    }
}

/// Scans buffer tokens and ledger labels and keeps the maximum of each
/// counter, so numbering never reuses a value still visible anywhere.
#[must_use]
pub fn parse_highest_counters(buffer: &str, attachments: &[Attachment]) -> Counters {
    let mut counters = Counters::default();

    for token in placeholder_tokens(buffer, CounterKind::Pasted) {
        counters.highest_paste = counters.highest_paste.max(token.counter);
    }
    for token in placeholder_tokens(buffer, CounterKind::Image) {
        counters.highest_image = counters.highest_image.max(token.counter);
    }

    for attachment in attachments {
        match (attachment.kind(), label_counter(&attachment.display)) {
            (AttachmentKind::Text, Some((CounterKind::Pasted, n))) => {
                counters.highest_paste = counters.highest_paste.max(n);
            }
            (AttachmentKind::File, Some((CounterKind::Image, n))) if attachment.is_image() => {
                counters.highest_image = counters.highest_image.max(n);
            }
            _ => {}
        }
    }

    counters
}

/// A `[pasted #N]` or `[Image #N]` occurrence in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub kind: CounterKind,
    pub counter: u32,
    pub range: TextRange,
}

#[must_use]
pub fn placeholder_tokens(buffer: &str, kind: CounterKind) -> Vec<PlaceholderToken> {
    let pattern = match kind {
        CounterKind::Pasted => &*PASTED_TOKEN,
        CounterKind::Image => &*IMAGE_TOKEN,
    };
    pattern
        .captures_iter(buffer)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let counter = caps[1].parse().ok()?;
            Some(PlaceholderToken {
                kind,
                counter,
                range: TextRange::new(whole.start(), whole.end()),
            })
        })
        .collect()
}

/// An `@name` run that starts a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionToken {
    /// Name without the leading `@` and without trailing sentence punctuation.
    pub name: String,
    /// Covers `@` through the end of `name`.
    pub range: TextRange,
}

impl MentionToken {
    /// Path-shaped mentions contain a `/`; bare `@word` may be an agent.
    #[must_use]
    pub fn is_path_like(&self) -> bool {
        self.name.contains('/')
    }
}

#[must_use]
pub fn mention_tokens(buffer: &str) -> Vec<MentionToken> {
    MENTION
        .captures_iter(buffer)
        .filter_map(|caps| {
            let token = caps.get(1)?;
            let raw = &token.as_str()[1..];
            let name = raw.trim_end_matches(is_trailing_punctuation);
            if name.is_empty() {
                return None;
            }
            let start = token.start();
            Some(MentionToken {
                name: name.to_string(),
                range: TextRange::new(start, start + 1 + name.len()),
            })
        })
        .collect()
}

fn is_trailing_punctuation(ch: char) -> bool {
    matches!(ch, ',' | ';' | ':' | '!' | '?' | ')' | '.' | '"' | '\'')
}

/// Tolerant pattern for reconciliation: internal whitespace and letter case
/// inside the brackets may drift without the token counting as gone.
#[must_use]
pub fn loose_placeholder_pattern(kind: CounterKind, counter: u32) -> Option<Regex> {
    let word = match kind {
        CounterKind::Pasted => "pasted",
        CounterKind::Image => "image",
    };
    Regex::new(&format!(r"(?i)\[\s*{word}\s*#\s*0*{counter}\s*\]")).ok()
}

/// Tolerant pattern for a mention: `@name` at a token start, ending at
/// whitespace, the end of the buffer or sentence punctuation.
#[must_use]
pub fn loose_mention_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(
        r#"(?:^|\s)@{}(?:$|[\s,;:!?)."'])"#,
        regex::escape(name)
    ))
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_canonical_tokens() {
        assert_eq!(format_pasted(4), "[pasted #4]");
        assert_eq!(format_image(1), "[Image #1]");
        assert_eq!(pasted_label(2, 1), "pasted #2 (1 line)");
        assert_eq!(pasted_label(3, 12), "pasted #3 (12 lines)");
    }

    #[test]
    fn highest_counters_merge_buffer_and_ledger() {
        let attachments = vec![
            Attachment::pasted_text(5, "x"),
            Attachment::image(2, "a.png", "image/png", None),
        ];
        let counters =
            parse_highest_counters("[pasted #3] and [Image #7] [pasted #1]", &attachments);
        assert_eq!(
            counters,
            Counters {
                highest_paste: 5,
                highest_image: 7,
            }
        );
        assert_eq!(counters.next_paste(), 6);
        assert_eq!(counters.next_image(), 8);
    }

    #[test]
    fn malformed_brackets_contribute_nothing() {
        let counters = parse_highest_counters("[pasted #9 [pasted #] pasted #4] [Image 3]", &[]);
        assert_eq!(counters, Counters::default());
    }

    #[test]
    fn overflowing_counter_is_ignored() {
        let counters = parse_highest_counters("[pasted #99999999999]", &[]);
        assert_eq!(counters.highest_paste, 0);
    }

    #[test]
    fn mentions_require_token_start() {
        let mentions = mention_tokens("mail me@host.com or see @src/a.ts, and @reviewer.");
        let names: Vec<&str> = mentions.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["src/a.ts", "reviewer"]);
        assert!(mentions[0].is_path_like());
        assert!(!mentions[1].is_path_like());
        assert_eq!(mentions[0].range, TextRange::new(24, 33));
    }

    #[test]
    fn loose_patterns_tolerate_whitespace() {
        let pasted = loose_placeholder_pattern(CounterKind::Pasted, 2).expect("pattern");
        assert!(pasted.is_match("x [ Pasted # 2 ] y"));
        assert!(!pasted.is_match("[pasted #21]"));

        let mention = loose_mention_pattern("src/a.ts").expect("pattern");
        assert!(mention.is_match("see @src/a.ts"));
        assert!(mention.is_match("@src/a.ts, ok"));
        assert!(!mention.is_match("see @src/a.tsx"));
    }
}
