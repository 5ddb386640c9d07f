#![allow(unused_imports)]

use prompt_composer::{
    dispatch, init_logging, matches_key, parse_key_id, Attachment, AttachmentId, AttachmentKind,
    AttachmentLedger, AttachmentSource, Composer, ComposerAction, ComposerAlert, ComposerConfig,
    ComposerError, ComposerKeybindings, ComposerKeybindingsConfig, ComposerMode, ComposerSnapshot,
    DraftBackend, DraftKey, FileCandidate, FileStore, HistoryBackend, Key, KeyEvent, KeyOutcome,
    MemoryStore, Modifiers, PickerItem, PickerMode, PickerSource, PickerView, PromptInputApi,
    PromptSender, SelectionFormat, SendError, SessionContext, SessionKey, SlashCommandSpec,
    Submission, SubmitPreference, SubmitTicket, TextRange, WorkspacePickerSource,
};

#[test]
fn public_api_exports_compile() {}
