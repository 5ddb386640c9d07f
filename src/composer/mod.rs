//! Prompt composition: buffer, attachments, picker, history and submission.

pub mod attachment;
pub mod error;
pub mod facade;
pub mod history;
pub mod ledger;
pub mod picker;
pub mod placeholder;
pub mod resolve;
pub mod router;
pub mod session;
pub mod sources;

/// Whether the buffer is a chat prompt or a shell command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerMode {
    #[default]
    Normal,
    Shell,
}

pub use attachment::{Attachment, AttachmentId, AttachmentKind, AttachmentSource};
pub use error::{ComposerAlert, ComposerError, SendError};
pub use facade::{
    dispatch, Composer, ComposerSnapshot, KeyOutcome, PromptInputApi, PromptSender,
    SelectionFormat, SubmitTicket,
};
pub use history::{HistoryGate, HistoryLog, PromptHistory, SharedHistory, DEFAULT_HISTORY_CAPACITY};
pub use ledger::AttachmentLedger;
pub use picker::{Confirm, PickerItem, PickerMode, PickerState, PickerView};
pub use resolve::Submission;
pub use session::{SessionContext, SessionKey, SessionRegistry};
pub use sources::{FileCandidate, PickerSource, SlashCommandSpec, WorkspacePickerSource};
