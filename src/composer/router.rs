//! Ordered key handling that runs before default text editing.
//!
//! [`route`] only decides. The composer applies the returned
//! [`RouteAction`] and then runs its post-mutation pass.

use crate::composer::attachment::AttachmentId;
use crate::composer::ledger::AttachmentLedger;
use crate::composer::placeholder::{mention_tokens, placeholder_tokens, CounterKind};
use crate::composer::ComposerMode;
use crate::core::buffer::TextRange;
use crate::core::input::KeyEvent;
use crate::core::keybindings::{ComposerAction, ComposerKeybindings};

/// What the router needs to see of a session.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub buffer: &'a str,
    pub selection: TextRange,
    pub mode: ComposerMode,
    pub picker_open: bool,
    pub ledger: &'a AttachmentLedger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    EnterShellMode,
    ExitShellMode,
    DismissPicker,
    /// Remove `range` from the buffer and `attachment` from the ledger.
    DeleteToken {
        range: TextRange,
        attachment: AttachmentId,
    },
    Submit,
    InsertNewline,
    PickerMove(isize),
    PickerConfirm,
    PickerComplete,
    PickerConfirmPlain,
    /// Falls through to default editing when history declines.
    HistoryPrevious,
    HistoryNext,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteDirection {
    Backward,
    Forward,
}

/// First matching rule wins.
#[must_use]
pub fn route(ctx: &RouteContext<'_>, event: &KeyEvent, keys: &ComposerKeybindings) -> RouteAction {
    let cursor_at_empty_start = ctx.buffer.is_empty() && ctx.selection.end == 0;

    if ctx.mode == ComposerMode::Normal
        && cursor_at_empty_start
        && keys.matches(event, ComposerAction::EnterShellMode)
    {
        return RouteAction::EnterShellMode;
    }

    if ctx.picker_open && keys.matches(event, ComposerAction::PickerCancel) {
        return RouteAction::DismissPicker;
    }

    if ctx.mode == ComposerMode::Shell {
        if keys.matches(event, ComposerAction::ExitShellMode) {
            return RouteAction::ExitShellMode;
        }
        if cursor_at_empty_start && keys.matches(event, ComposerAction::DeleteBackward) {
            return RouteAction::ExitShellMode;
        }
    }

    let direction = if keys.matches(event, ComposerAction::DeleteBackward) {
        Some(DeleteDirection::Backward)
    } else if keys.matches(event, ComposerAction::DeleteForward) {
        Some(DeleteDirection::Forward)
    } else {
        None
    };
    if let Some(direction) = direction {
        if let Some(action) = token_deletion(ctx, direction) {
            return action;
        }
        return RouteAction::Default;
    }

    if ctx.picker_open && keys.matches(event, ComposerAction::PickerConfirm) && event.is_unmodified()
    {
        return RouteAction::PickerConfirm;
    }
    if keys.matches(event, ComposerAction::Submit) {
        return RouteAction::Submit;
    }
    if keys.matches(event, ComposerAction::NewLine) {
        return RouteAction::InsertNewline;
    }

    if ctx.picker_open {
        if keys.matches(event, ComposerAction::PickerUp) {
            return RouteAction::PickerMove(-1);
        }
        if keys.matches(event, ComposerAction::PickerDown) {
            return RouteAction::PickerMove(1);
        }
    }
    if keys.matches(event, ComposerAction::HistoryPrevious) {
        return RouteAction::HistoryPrevious;
    }
    if keys.matches(event, ComposerAction::HistoryNext) {
        return RouteAction::HistoryNext;
    }

    if ctx.picker_open {
        if keys.matches(event, ComposerAction::PickerConfirmPlain) {
            return RouteAction::PickerConfirmPlain;
        }
        if keys.matches(event, ComposerAction::PickerComplete) {
            return RouteAction::PickerComplete;
        }
    }

    RouteAction::Default
}

fn deletes_into(token: TextRange, selection: TextRange, direction: DeleteDirection) -> bool {
    if !selection.is_collapsed() {
        return token.start < selection.end && selection.start < token.end;
    }
    let cursor = selection.end;
    match direction {
        DeleteDirection::Backward => token.start < cursor && cursor <= token.end,
        DeleteDirection::Forward => token.start <= cursor && cursor < token.end,
    }
}

/// Pasted placeholders, then image placeholders, then mentions. Only tokens
/// backed by a ledger entry are deleted atomically.
fn token_deletion(ctx: &RouteContext<'_>, direction: DeleteDirection) -> Option<RouteAction> {
    let selection = ctx.selection;
    let widen = |token: TextRange| {
        if selection.is_collapsed() {
            token
        } else {
            TextRange::new(token.start.min(selection.start), token.end.max(selection.end))
        }
    };

    for kind in [CounterKind::Pasted, CounterKind::Image] {
        for token in placeholder_tokens(ctx.buffer, kind) {
            if !deletes_into(token.range, selection, direction) {
                continue;
            }
            let backing = match kind {
                CounterKind::Pasted => ctx.ledger.find_pasted(token.counter),
                CounterKind::Image => ctx.ledger.find_image(token.counter),
            };
            if let Some(attachment) = backing {
                return Some(RouteAction::DeleteToken {
                    range: widen(token.range),
                    attachment: attachment.id.clone(),
                });
            }
        }
    }

    for mention in mention_tokens(ctx.buffer) {
        if !deletes_into(mention.range, selection, direction) {
            continue;
        }
        if let Some(attachment) = ctx.ledger.find_mention(&mention.name) {
            return Some(RouteAction::DeleteToken {
                range: widen(mention.range),
                attachment: attachment.id.clone(),
            });
        }
    }

    None
}
