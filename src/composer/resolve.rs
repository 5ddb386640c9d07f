//! Send-time resolution of the buffer into wire text.

use crate::composer::attachment::{Attachment, AttachmentKind};
use crate::composer::ledger::AttachmentLedger;
use crate::composer::placeholder::{mention_tokens, placeholder_tokens, CounterKind};
use crate::composer::sources::PickerSource;
use crate::composer::ComposerMode;
use crate::core::buffer::TextRange;

/// What the composer hands to its send collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Chat prompt. Pasted text is already inlined; the attachments are the
    /// files, images and agents still referenced.
    Prompt {
        text: String,
        attachments: Vec<Attachment>,
    },
    Shell {
        command: String,
    },
    /// A recognized slash command. The ledger is kept for the next prompt.
    Command {
        name: String,
        arguments: String,
    },
}

impl Submission {
    #[must_use]
    pub fn is_command(&self) -> bool {
        matches!(self, Submission::Command { .. })
    }
}

/// Replaces backed `[pasted #N]` tokens with their text and drops the `@`
/// from path mentions that have no file attachment. Image placeholders and
/// backed mentions are left as written.
#[must_use]
pub fn resolve_text(buffer: &str, ledger: &AttachmentLedger) -> String {
    let mut edits: Vec<(TextRange, String)> = Vec::new();

    let pasted = placeholder_tokens(buffer, CounterKind::Pasted);
    let mut placeholders: Vec<TextRange> = pasted.iter().map(|token| token.range).collect();
    placeholders.extend(
        placeholder_tokens(buffer, CounterKind::Image)
            .into_iter()
            .map(|token| token.range),
    );

    for token in pasted {
        if let Some(value) = ledger
            .find_pasted(token.counter)
            .and_then(Attachment::text_value)
        {
            edits.push((token.range, value.to_string()));
        }
    }

    for mention in mention_tokens(buffer) {
        if !mention.is_path_like() {
            continue;
        }
        // A mention running into a placeholder is left as written.
        if placeholders.iter().any(|range| overlaps(*range, mention.range)) {
            continue;
        }
        let attached = ledger
            .find_mention(&mention.name)
            .is_some_and(|attachment| attachment.kind() == AttachmentKind::File);
        if !attached {
            edits.push((mention.range, mention.name.clone()));
        }
    }

    edits.sort_by_key(|(range, _)| range.start);
    let mut resolved = buffer.to_string();
    for (range, replacement) in edits.into_iter().rev() {
        resolved.replace_range(range.start..range.end, &replacement);
    }
    resolved
}

fn overlaps(a: TextRange, b: TextRange) -> bool {
    a.start < b.end && b.start < a.end
}

/// `/name rest` when `name` is a known command.
#[must_use]
pub fn recognize_command<'a>(buffer: &'a str, source: &dyn PickerSource) -> Option<(&'a str, &'a str)> {
    let body = buffer.trim_start().strip_prefix('/')?;
    let (name, rest) = match body.find(char::is_whitespace) {
        Some(idx) => (&body[..idx], &body[idx..]),
        None => (body, ""),
    };
    if name.is_empty() || !source.is_command(name) {
        return None;
    }
    Some((name, rest))
}

/// Builds the submission for the current buffer.
#[must_use]
pub fn resolve_submission(
    buffer: &str,
    ledger: &AttachmentLedger,
    mode: ComposerMode,
    source: &dyn PickerSource,
) -> Submission {
    if mode == ComposerMode::Shell {
        return Submission::Shell {
            command: resolve_text(buffer, ledger).trim().to_string(),
        };
    }

    if let Some((name, rest)) = recognize_command(buffer, source) {
        return Submission::Command {
            name: name.to_string(),
            arguments: resolve_text(rest, ledger).trim().to_string(),
        };
    }

    let attachments = ledger
        .list()
        .iter()
        .filter(|attachment| attachment.kind() != AttachmentKind::Text)
        .cloned()
        .collect();
    Submission::Prompt {
        text: resolve_text(buffer, ledger).trim().to_string(),
        attachments,
    }
}
