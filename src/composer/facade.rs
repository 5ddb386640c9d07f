//! The composer object hosts talk to.
//!
//! Every public mutation ends with the same post-mutation pass: reconcile
//! the ledger against the buffer, re-evaluate picker triggers, then persist
//! the draft unless history is being browsed.

use std::collections::HashMap;
use std::sync::Arc;

use composer_store::{DraftBackend, HistoryBackend};

use crate::composer::attachment::{guess_media_type, Attachment, AttachmentId};
use crate::composer::error::{ComposerAlert, ComposerError, SendError};
use crate::composer::history::{HistoryGate, HistoryLog, SharedHistory};
use crate::composer::picker::{Confirm, PickerView};
use crate::composer::placeholder::{
    format_image, format_pasted, parse_highest_counters, placeholder_tokens, CounterKind,
};
use crate::composer::resolve::{resolve_submission, Submission};
use crate::composer::router::{route, RouteAction, RouteContext};
use crate::composer::session::{SessionContext, SessionKey, SessionRegistry};
use crate::composer::sources::{candidates, PickerSource};
use crate::composer::ComposerMode;
use crate::config::ComposerConfig;
use crate::core::buffer::{line_start, normalize_newlines, TextRange};
use crate::core::input::KeyEvent;
use crate::core::keybindings::{ComposerAction, ComposerKeybindings, SubmitPreference};

/// How [`PromptInputApi::insert_selection`] formats external text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionFormat {
    Quote,
    Code,
}

/// A submission taken from one session, awaiting its send result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    pub session: SessionKey,
    pub submission: Submission,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not consumed; the host may use the key.
    Ignored,
    Handled,
    /// The key submitted. Send it, then call [`Composer::complete_submit`].
    Submit(SubmitTicket),
}

impl KeyOutcome {
    #[must_use]
    pub fn is_handled(&self) -> bool {
        !matches!(self, KeyOutcome::Ignored)
    }
}

/// Send-side collaborator.
pub trait PromptSender {
    fn send(&mut self, text: &str, attachments: &[Attachment]) -> Result<(), SendError>;

    fn run_shell(&mut self, command: &str) -> Result<(), SendError>;

    fn run_command(&mut self, name: &str, arguments: &str) -> Result<(), SendError> {
        let line = if arguments.is_empty() {
            format!("/{name}")
        } else {
            format!("/{name} {arguments}")
        };
        self.send(&line, &[])
    }
}

/// Routes a submission to the matching collaborator call.
pub fn dispatch(sender: &mut dyn PromptSender, submission: &Submission) -> Result<(), SendError> {
    match submission {
        Submission::Prompt { text, attachments } => sender.send(text, attachments),
        Submission::Shell { command } => sender.run_shell(command),
        Submission::Command { name, arguments } => sender.run_command(name, arguments),
    }
}

/// Imperative surface other UI regions use to drive the composer.
pub trait PromptInputApi {
    fn insert_selection(&mut self, text: &str, format: SelectionFormat) -> Result<(), ComposerError>;

    fn expand_text_attachment(&mut self, id: &AttachmentId) -> Result<(), ComposerError>;

    /// Replaces buffer and attachments, e.g. to restore a reverted message.
    fn set_prompt_text(
        &mut self,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), ComposerError>;

    fn focus(&mut self) -> Result<(), ComposerError>;
}

/// Derived state for presentation, recomputed from the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerSnapshot {
    pub session: SessionKey,
    pub text: String,
    pub cursor: usize,
    pub selection: TextRange,
    pub mode: ComposerMode,
    pub picker: Option<PickerView>,
    pub attachments: Vec<Attachment>,
    pub can_send: bool,
    pub has_history: bool,
    pub is_browsing_history: bool,
    pub is_sending: bool,
    pub focused: bool,
    pub alert: Option<ComposerAlert>,
}

impl ComposerSnapshot {
    fn of(ctx: &SessionContext) -> Self {
        Self {
            session: ctx.key.clone(),
            text: ctx.buffer.clone(),
            cursor: ctx.selection.end,
            selection: ctx.selection,
            mode: ctx.mode,
            picker: ctx.picker.view(),
            attachments: ctx.ledger.list().to_vec(),
            can_send: ctx.can_send(),
            has_history: ctx.history.has_history(),
            is_browsing_history: ctx.history.is_browsing(),
            is_sending: ctx.sending,
            focused: ctx.focused,
            alert: ctx.alert.clone(),
        }
    }
}

struct Services {
    config: ComposerConfig,
    keybindings: ComposerKeybindings,
    history_backend: Arc<dyn HistoryBackend>,
    drafts: Arc<dyn DraftBackend>,
    source: Box<dyn PickerSource>,
}

pub struct Composer {
    services: Services,
    sessions: SessionRegistry,
    /// One history per instance, shared by all of its sessions.
    histories: HashMap<String, SharedHistory>,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("config", &self.services.config)
            .field("sessions", &self.sessions)
            .finish()
    }
}

impl Composer {
    pub fn new(
        config: ComposerConfig,
        history_backend: Arc<dyn HistoryBackend>,
        drafts: Arc<dyn DraftBackend>,
        source: Box<dyn PickerSource>,
    ) -> Self {
        let preference = if config.submit_with_modifier {
            SubmitPreference::ModifierEnter
        } else {
            SubmitPreference::Enter
        };
        Self {
            services: Services {
                keybindings: ComposerKeybindings::new(Default::default(), preference),
                config,
                history_backend,
                drafts,
                source,
            },
            sessions: SessionRegistry::new(),
            histories: HashMap::new(),
        }
    }

    /// One store serving both history and drafts.
    pub fn with_store<S>(config: ComposerConfig, store: Arc<S>, source: Box<dyn PickerSource>) -> Self
    where
        S: HistoryBackend + DraftBackend + 'static,
    {
        Self::new(config, store.clone(), store, source)
    }

    #[must_use]
    pub fn config(&self) -> &ComposerConfig {
        &self.services.config
    }

    #[must_use]
    pub fn keybindings(&self) -> &ComposerKeybindings {
        &self.services.keybindings
    }

    pub fn keybindings_mut(&mut self) -> &mut ComposerKeybindings {
        &mut self.services.keybindings
    }

    pub fn set_submit_preference(&mut self, preference: SubmitPreference) {
        self.services.keybindings.set_submit_preference(preference);
    }

    // Sessions

    /// Opens (or re-activates) the session for `key` and makes it active.
    pub fn open_session(&mut self, key: SessionKey) {
        if self.sessions.contains(&key) {
            // Present by the check above.
            let _ = self.sessions.activate(&key);
            return;
        }
        let history = self.history_for(&key.instance_id);
        let mut context = SessionContext::open(key, history, self.services.drafts.as_ref());
        self.services.commit(&mut context);
        tracing::debug!(
            instance = %context.key.instance_id,
            session = %context.key.session_id,
            "composer session opened"
        );
        self.sessions.insert(context);
    }

    fn history_for(&mut self, instance_id: &str) -> SharedHistory {
        let services = &self.services;
        self.histories
            .entry(instance_id.to_string())
            .or_insert_with(|| {
                HistoryLog::load(
                    instance_id,
                    services.config.history_limit,
                    services.history_backend.clone(),
                )
                .shared()
            })
            .clone()
    }

    /// Drops the session's state. Returns false when it was not open.
    pub fn close_session(&mut self, key: &SessionKey) -> bool {
        let closed = self.sessions.remove(key).is_some();
        if closed {
            tracing::debug!(instance = %key.instance_id, session = %key.session_id, "composer session closed");
        }
        closed
    }

    pub fn switch_session(&mut self, key: &SessionKey) -> Result<(), ComposerError> {
        self.sessions.activate(key)
    }

    #[must_use]
    pub fn active_session(&self) -> Option<&SessionKey> {
        self.sessions.active_key()
    }

    pub fn session(&self) -> Result<&SessionContext, ComposerError> {
        self.sessions.active()
    }

    // Reads

    pub fn prompt(&self) -> Result<String, ComposerError> {
        Ok(self.sessions.active()?.buffer.clone())
    }

    pub fn attachments(&self) -> Result<Vec<Attachment>, ComposerError> {
        Ok(self.sessions.active()?.ledger.list().to_vec())
    }

    pub fn snapshot(&self) -> Result<ComposerSnapshot, ComposerError> {
        Ok(ComposerSnapshot::of(self.sessions.active()?))
    }

    // Editing

    pub fn handle_key(&mut self, event: &KeyEvent) -> Result<KeyOutcome, ComposerError> {
        let ctx = self.sessions.active_mut()?;
        let action = route(
            &RouteContext {
                buffer: &ctx.buffer,
                selection: ctx.selection,
                mode: ctx.mode,
                picker_open: ctx.picker.is_open(),
                ledger: &ctx.ledger,
            },
            event,
            &self.services.keybindings,
        );
        tracing::trace!(key = %event, ?action, "routed key");
        Ok(self.services.apply(ctx, action, event))
    }

    pub fn insert_text(&mut self, text: &str) -> Result<(), ComposerError> {
        let ctx = self.sessions.active_mut()?;
        ctx.replace_selection(&normalize_newlines(text));
        self.services.commit(ctx);
        Ok(())
    }

    /// Moves the cursor, or selects when `anchor` differs from `cursor`.
    pub fn set_selection(&mut self, anchor: usize, cursor: usize) -> Result<(), ComposerError> {
        let ctx = self.sessions.active_mut()?;
        ctx.move_to(anchor);
        let anchor = ctx.selection.start;
        ctx.move_to(cursor);
        ctx.selection = TextRange::new(anchor, ctx.selection.end);
        self.services.commit(ctx);
        Ok(())
    }

    /// Inserts pasted text, replacing large pastes with a `[pasted #N]`
    /// placeholder backed by a text attachment.
    pub fn paste_text(&mut self, text: &str) -> Result<(), ComposerError> {
        let ctx = self.sessions.active_mut()?;
        let cleaned: String = normalize_newlines(text)
            .chars()
            .filter(|ch| matches!(ch, '\n' | '\t') || !ch.is_control())
            .collect();
        if cleaned.is_empty() {
            return Ok(());
        }

        if self.services.config.is_large_paste(&cleaned) {
            let counter = next_counter(ctx, CounterKind::Pasted);
            let attachment = Attachment::pasted_text(counter, cleaned);
            tracing::debug!(counter, label = %attachment.display, "large paste collapsed");
            ctx.ledger.add(attachment);
            let token = format!("{}{}", ctx.token_gap(), format_pasted(counter));
            ctx.replace_selection(&token);
        } else {
            ctx.replace_selection(&cleaned);
        }
        self.services.commit(ctx);
        Ok(())
    }

    /// Inserts an `[Image #N]` placeholder backed by an image attachment.
    pub fn paste_image(
        &mut self,
        data: Vec<u8>,
        media_type: &str,
        filename: Option<&str>,
    ) -> Result<AttachmentId, ComposerError> {
        let ctx = self.sessions.active_mut()?;
        let counter = next_counter(ctx, CounterKind::Image);
        let filename = match filename {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => {
                let extension = mime_guess::get_mime_extensions_str(media_type)
                    .and_then(|extensions| extensions.first())
                    .copied()
                    .unwrap_or("png");
                format!("image-{counter}.{extension}")
            }
        };
        let id = ctx
            .ledger
            .add(Attachment::image(counter, filename, media_type, Some(data)));
        let token = format!("{}{}", ctx.token_gap(), format_image(counter));
        ctx.replace_selection(&token);
        self.services.commit(ctx);
        Ok(id)
    }

    /// Images become `[Image #N]` placeholders, other paths `@path` mentions.
    /// Paths containing whitespace cannot form a mention and are skipped.
    pub fn drop_files<P: AsRef<str>>(&mut self, paths: &[P]) -> Result<(), ComposerError> {
        let ctx = self.sessions.active_mut()?;
        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                continue;
            }
            let media_type = guess_media_type(path);
            if media_type.starts_with("image/") {
                let counter = next_counter(ctx, CounterKind::Image);
                ctx.ledger
                    .add(Attachment::image(counter, path, media_type, None));
                let token = format!("{}{}", ctx.token_gap(), format_image(counter));
                ctx.replace_selection(&token);
                continue;
            }
            if path.chars().any(char::is_whitespace) {
                tracing::warn!(path, "dropped path contains whitespace; skipped");
                continue;
            }
            if ctx.ledger.find_mention(path).is_none() {
                ctx.ledger.add(Attachment::file(path, media_type));
            }
            let token = format!("{}@{path} ", ctx.token_gap());
            ctx.replace_selection(&token);
        }
        self.services.commit(ctx);
        Ok(())
    }

    /// Closes the open picker. Its trigger stays ignored until the trigger
    /// character moves or is retyped. Returns false when nothing was open.
    pub fn dismiss_picker(&mut self) -> Result<bool, ComposerError> {
        let ctx = self.sessions.active_mut()?;
        let was_open = ctx.picker.is_open();
        ctx.picker.dismiss();
        Ok(was_open)
    }

    /// Confirms the candidate at `index`, as a click on a picker row would.
    /// Returns false when no picker is open or `index` is out of range.
    pub fn select_picker_item(&mut self, index: usize, confirm: Confirm) -> Result<bool, ComposerError> {
        let ctx = self.sessions.active_mut()?;
        if !ctx.picker.is_open() || !ctx.picker.set_highlighted(index) {
            return Ok(false);
        }
        self.services.confirm_picker(ctx, confirm, None);
        Ok(true)
    }

    /// Writes the buffer. The draft is persisted only when not browsing
    /// history.
    pub fn set_prompt(&mut self, text: &str) -> Result<(), ComposerError> {
        let ctx = self.sessions.active_mut()?;
        ctx.set_buffer(normalize_newlines(text));
        self.services.commit(ctx);
        Ok(())
    }

    /// Clears buffer, attachments and draft and returns to normal mode.
    pub fn clear_prompt(&mut self) -> Result<(), ComposerError> {
        let ctx = self.sessions.active_mut()?;
        ctx.set_buffer(String::new());
        ctx.ledger.clear();
        ctx.mode = ComposerMode::Normal;
        ctx.picker.reset();
        ctx.history.stop_browsing();
        self.services.commit(ctx);
        Ok(())
    }

    pub fn remove_attachment(&mut self, id: &AttachmentId) -> Result<Attachment, ComposerError> {
        let ctx = self.sessions.active_mut()?;
        let removed = ctx
            .ledger
            .remove(id)
            .ok_or_else(|| ComposerError::UnknownAttachment(id.clone()))?;
        if let Some(range) = token_range(&ctx.buffer, &removed) {
            ctx.replace_range(range, "");
        }
        self.services.commit(ctx);
        Ok(removed)
    }

    pub fn dismiss_alert(&mut self) -> Result<(), ComposerError> {
        self.sessions.active_mut()?.alert = None;
        Ok(())
    }

    pub fn blur(&mut self) -> Result<(), ComposerError> {
        self.sessions.active_mut()?.focused = false;
        Ok(())
    }

    // Submission

    /// Takes the prompt for sending: resolves it, records history and
    /// clears optimistically. A recognized slash command keeps its
    /// attachments for the next message.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, ComposerError> {
        let ctx = self.sessions.active_mut()?;
        self.services.begin_submit(ctx)
    }

    /// Reports the send result for `session`. A failure raises an alert; the
    /// cleared prompt is not restored.
    pub fn complete_submit(
        &mut self,
        session: &SessionKey,
        result: Result<(), SendError>,
    ) -> Result<(), ComposerError> {
        let ctx = self.sessions.get_mut(session)?;
        ctx.sending = false;
        match result {
            Ok(()) => {
                tracing::info!(session = %session.session_id, "prompt sent");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(session = %session.session_id, error = %err, "prompt send failed");
                ctx.alert = Some(ComposerAlert::send_failed(&err));
                Err(ComposerError::Send(err))
            }
        }
    }

    /// Both submission phases against a synchronous sender.
    pub fn submit_with(&mut self, sender: &mut dyn PromptSender) -> Result<(), ComposerError> {
        let ticket = self.begin_submit()?;
        let result = dispatch(sender, &ticket.submission);
        self.complete_submit(&ticket.session, result)
    }
}

impl PromptInputApi for Composer {
    fn insert_selection(&mut self, text: &str, format: SelectionFormat) -> Result<(), ComposerError> {
        let ctx = self.sessions.active_mut()?;
        let text = normalize_newlines(text);
        let body = match format {
            SelectionFormat::Quote => text
                .trim_end_matches('\n')
                .split('\n')
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            SelectionFormat::Code => format!("```\n{}\n```", text.trim_end_matches('\n')),
        };

        let at = ctx.selection.start;
        let mid_line = at > line_start(&ctx.buffer, at);
        let mut insertion = String::with_capacity(body.len() + 2);
        if mid_line {
            insertion.push('\n');
        }
        insertion.push_str(&body);
        insertion.push('\n');

        ctx.replace_selection(&insertion);
        self.services.commit(ctx);
        Ok(())
    }

    fn expand_text_attachment(&mut self, id: &AttachmentId) -> Result<(), ComposerError> {
        let ctx = self.sessions.active_mut()?;
        let attachment = ctx
            .ledger
            .get(id)
            .ok_or_else(|| ComposerError::UnknownAttachment(id.clone()))?;
        let value = attachment
            .text_value()
            .ok_or_else(|| ComposerError::NotTextAttachment(id.clone()))?
            .to_string();
        let range = token_range(&ctx.buffer, attachment);

        ctx.ledger.remove(id);
        match range {
            Some(range) => ctx.replace_range(range, &value),
            None => ctx.replace_selection(&value),
        }
        self.services.commit(ctx);
        Ok(())
    }

    fn set_prompt_text(
        &mut self,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), ComposerError> {
        let ctx = self.sessions.active_mut()?;
        ctx.ledger.replace_all(attachments);
        ctx.set_buffer(normalize_newlines(text));
        self.services.commit(ctx);
        Ok(())
    }

    fn focus(&mut self) -> Result<(), ComposerError> {
        self.sessions.active_mut()?.focused = true;
        Ok(())
    }
}

/// Next free counter: above everything in the buffer, the ledger and every
/// number already handed out in this session.
fn next_counter(ctx: &mut SessionContext, kind: CounterKind) -> u32 {
    let seen = parse_highest_counters(&ctx.buffer, ctx.ledger.list());
    match kind {
        CounterKind::Pasted => {
            let next = seen
                .highest_paste
                .max(ctx.issued.highest_paste)
                .saturating_add(1);
            ctx.issued.highest_paste = next;
            next
        }
        CounterKind::Image => {
            let next = seen
                .highest_image
                .max(ctx.issued.highest_image)
                .saturating_add(1);
            ctx.issued.highest_image = next;
            next
        }
    }
}

/// Where the attachment's placeholder sits in the buffer, if anywhere.
fn token_range(buffer: &str, attachment: &Attachment) -> Option<TextRange> {
    let counter = attachment.counter()?;
    let kind = if attachment.is_image() {
        CounterKind::Image
    } else {
        CounterKind::Pasted
    };
    placeholder_tokens(buffer, kind)
        .into_iter()
        .find(|token| token.counter == counter)
        .map(|token| token.range)
}

fn load_persisted_draft(drafts: &dyn DraftBackend, key: &SessionKey) -> Option<String> {
    match drafts.load_draft(key) {
        Ok(draft) => draft,
        Err(err) => {
            tracing::warn!(session = %key.session_id, error = %err, "failed to load draft");
            None
        }
    }
}

impl Services {
    fn commit(&self, ctx: &mut SessionContext) {
        self.commit_inner(ctx, false);
    }

    /// History recall shows stored text verbatim, so triggers in it stay
    /// closed until the user edits.
    fn commit_recalled(&self, ctx: &mut SessionContext) {
        self.commit_inner(ctx, true);
    }

    fn commit_inner(&self, ctx: &mut SessionContext, recalled: bool) {
        ctx.ledger.reconcile(&ctx.buffer);

        if recalled {
            ctx.picker.close();
        } else {
            let shell = ctx.mode == ComposerMode::Shell;
            let changed = ctx.picker.evaluate(&ctx.buffer, ctx.selection, shell);
            if changed {
                if let Some(mode) = ctx.picker.mode() {
                    let items = candidates(self.source.as_ref(), mode, ctx.picker.search_query());
                    ctx.picker.set_items(items);
                }
            }
        }

        if !ctx.history.is_browsing() && ctx.buffer != ctx.saved_draft {
            match self.drafts.save_draft(&ctx.key, &ctx.buffer) {
                Ok(()) => ctx.saved_draft = ctx.buffer.clone(),
                Err(err) => tracing::warn!(
                    session = %ctx.key.session_id,
                    error = %err,
                    "failed to persist draft"
                ),
            }
        }
    }

    fn apply(&self, ctx: &mut SessionContext, action: RouteAction, event: &KeyEvent) -> KeyOutcome {
        match action {
            RouteAction::EnterShellMode => {
                ctx.mode = ComposerMode::Shell;
                ctx.picker.reset();
                tracing::debug!("shell mode on");
                KeyOutcome::Handled
            }
            RouteAction::ExitShellMode => {
                ctx.mode = ComposerMode::Normal;
                tracing::debug!("shell mode off");
                self.commit(ctx);
                KeyOutcome::Handled
            }
            RouteAction::DismissPicker => {
                ctx.picker.dismiss();
                KeyOutcome::Handled
            }
            RouteAction::DeleteToken { range, attachment } => {
                ctx.replace_range(range, "");
                ctx.ledger.remove(&attachment);
                self.commit(ctx);
                KeyOutcome::Handled
            }
            RouteAction::Submit => self.submit_key(ctx),
            RouteAction::InsertNewline => {
                ctx.replace_selection("\n");
                self.commit(ctx);
                KeyOutcome::Handled
            }
            RouteAction::PickerMove(delta) => {
                ctx.picker.move_highlight(delta);
                KeyOutcome::Handled
            }
            RouteAction::PickerConfirm => self.confirm_picker(ctx, Confirm::Select, Some(event)),
            RouteAction::PickerComplete => self.confirm_picker(ctx, Confirm::Complete, Some(event)),
            RouteAction::PickerConfirmPlain => {
                self.confirm_picker(ctx, Confirm::PlainText, Some(event))
            }
            RouteAction::HistoryPrevious => {
                let gate = HistoryGate {
                    force: false,
                    picker_open: ctx.picker.is_open(),
                    cursor_at_start: ctx.selection == TextRange::collapsed(0),
                };
                match ctx.history.select_previous(&ctx.buffer, gate) {
                    Some(text) => {
                        ctx.set_buffer(text);
                        self.commit_recalled(ctx);
                        KeyOutcome::Handled
                    }
                    None => self.default_edit(ctx, event),
                }
            }
            RouteAction::HistoryNext => {
                let drafts = self.drafts.as_ref();
                let key = ctx.key.clone();
                match ctx.history.select_next(|| load_persisted_draft(drafts, &key)) {
                    Some(text) => {
                        let restored_draft = !ctx.history.is_browsing();
                        ctx.set_buffer(text);
                        if restored_draft {
                            self.commit(ctx);
                        } else {
                            self.commit_recalled(ctx);
                        }
                        KeyOutcome::Handled
                    }
                    None => self.default_edit(ctx, event),
                }
            }
            RouteAction::Default => self.default_edit(ctx, event),
        }
    }

    fn begin_submit(&self, ctx: &mut SessionContext) -> Result<SubmitTicket, ComposerError> {
        if ctx.sending {
            return Err(ComposerError::SendInFlight);
        }
        if !ctx.can_send() {
            return Err(ComposerError::EmptyPrompt);
        }

        let submission = resolve_submission(&ctx.buffer, &ctx.ledger, ctx.mode, self.source.as_ref());
        let entry = std::mem::take(&mut ctx.buffer);
        ctx.history.record(&entry);

        // Kept attachments stay referenced from the fresh buffer.
        let carried = if submission.is_command() {
            ctx.ledger
                .list()
                .iter()
                .map(|attachment| format!("{} ", attachment.token()))
                .collect::<String>()
        } else {
            ctx.ledger.clear();
            String::new()
        };
        ctx.set_buffer(carried);
        ctx.mode = ComposerMode::Normal;
        ctx.picker.reset();
        ctx.alert = None;
        ctx.sending = true;
        self.commit(ctx);

        let kind = match &submission {
            Submission::Prompt { .. } => "prompt",
            Submission::Shell { .. } => "shell",
            Submission::Command { .. } => "command",
        };
        tracing::info!(session = %ctx.key.session_id, kind, "submission started");
        Ok(SubmitTicket {
            session: ctx.key.clone(),
            submission,
        })
    }

    fn submit_key(&self, ctx: &mut SessionContext) -> KeyOutcome {
        match self.begin_submit(ctx) {
            Ok(ticket) => KeyOutcome::Submit(ticket),
            Err(err) => {
                tracing::debug!(error = %err, "submit key ignored");
                KeyOutcome::Handled
            }
        }
    }

    /// `event` is the key that confirmed, if any; a submit key with nothing
    /// to pick falls through to submission.
    fn confirm_picker(
        &self,
        ctx: &mut SessionContext,
        confirm: Confirm,
        event: Option<&KeyEvent>,
    ) -> KeyOutcome {
        let cursor = ctx.selection.end;
        let edit = ctx
            .picker
            .highlighted()
            .and_then(|item| ctx.picker.confirm_edit(item, cursor, confirm));

        let Some(edit) = edit else {
            // Nothing to pick: close and let Enter submit as usual.
            ctx.picker.dismiss();
            if event.is_some_and(|event| self.keybindings.matches(event, ComposerAction::Submit)) {
                return self.submit_key(ctx);
            }
            return KeyOutcome::Handled;
        };

        ctx.replace_range(edit.range, &edit.replacement);
        if let Some(attachment) = edit.attachment {
            if ctx.ledger.find_mention(&attachment.filename).is_none() {
                ctx.ledger.add(attachment);
            }
        }
        if !edit.keep_open {
            ctx.picker.close();
        }
        self.commit(ctx);
        KeyOutcome::Handled
    }

    fn default_edit(&self, ctx: &mut SessionContext, event: &KeyEvent) -> KeyOutcome {
        let keys = &self.keybindings;
        let handled = if keys.matches(event, ComposerAction::DeleteBackward) {
            ctx.delete_backward();
            true
        } else if keys.matches(event, ComposerAction::DeleteForward) {
            ctx.delete_forward();
            true
        } else if keys.matches(event, ComposerAction::CursorLeft) {
            ctx.move_left();
            true
        } else if keys.matches(event, ComposerAction::CursorRight) {
            ctx.move_right();
            true
        } else if keys.matches(event, ComposerAction::CursorLineStart) {
            ctx.move_line_start();
            true
        } else if keys.matches(event, ComposerAction::CursorLineEnd) {
            ctx.move_line_end();
            true
        } else if keys.matches(event, ComposerAction::SelectAll) {
            ctx.select_all();
            true
        } else if keys.matches(event, ComposerAction::HistoryPrevious) {
            ctx.move_vertical(-1)
        } else if keys.matches(event, ComposerAction::HistoryNext) {
            ctx.move_vertical(1)
        } else if let Some(ch) = event.printable() {
            let mut utf8 = [0u8; 4];
            ctx.replace_selection(ch.encode_utf8(&mut utf8));
            true
        } else {
            false
        };

        if !handled {
            return KeyOutcome::Ignored;
        }
        self.commit(ctx);
        KeyOutcome::Handled
    }
}
