//! Prompt composition engine for chat-style coding assistants.
//!
//! Invariant: every placeholder or mention token in a session's buffer is
//! either backed by an attachment in that session's ledger or inert text,
//! and the ledger never holds an attachment whose token has left the buffer.
//!
//! # Public API Overview
//! - Open a session on a [`Composer`] and feed it [`KeyEvent`]s, pastes and
//!   drops; read derived state through [`ComposerSnapshot`].
//! - Submit with [`Composer::begin_submit`] / [`Composer::complete_submit`],
//!   or [`Composer::submit_with`] against a [`PromptSender`].
//! - Drive the composer from other UI regions through [`PromptInputApi`].
//! - Persist drafts and history with any [`composer_store`] backend.

pub mod config;
pub mod logging;

pub mod composer;
pub mod core;

/// Composer facade, collaborators and derived state.
pub use crate::composer::{
    dispatch, Composer, ComposerMode, ComposerSnapshot, KeyOutcome, PromptInputApi,
    PromptSender, SelectionFormat, SubmitTicket, Submission,
};

/// Attachments and the per-session ledger.
pub use crate::composer::{
    Attachment, AttachmentId, AttachmentKind, AttachmentLedger, AttachmentSource,
};

/// Errors and user-visible alerts.
pub use crate::composer::{ComposerAlert, ComposerError, SendError};

/// Picker state and candidate sources.
pub use crate::composer::{
    Confirm, FileCandidate, PickerItem, PickerMode, PickerSource, PickerView, SlashCommandSpec,
    WorkspacePickerSource,
};

/// Sessions.
pub use crate::composer::{SessionContext, SessionKey};

/// Configuration and logging.
pub use crate::config::ComposerConfig;
pub use crate::logging::init_logging;

/// Key events and bindings.
pub use crate::core::input::{matches_key, parse_key_id, Key, KeyEvent, Modifiers};
pub use crate::core::keybindings::{
    ComposerAction, ComposerKeybindings, ComposerKeybindingsConfig, SubmitPreference,
};

/// Buffer selection type.
pub use crate::core::buffer::TextRange;

/// Persistence backends.
pub use composer_store::{DraftBackend, DraftKey, FileStore, HistoryBackend, MemoryStore};
