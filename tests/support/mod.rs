#![allow(dead_code)]

use std::sync::Arc;

use prompt_composer::{
    Attachment, Composer, ComposerConfig, FileCandidate, Key, KeyEvent, KeyOutcome, MemoryStore,
    Modifiers, PickerSource, PromptSender, SendError, SessionKey, SlashCommandSpec,
};

pub const INSTANCE: &str = "workspace";
pub const SESSION: &str = "session-1";

pub fn session_key() -> SessionKey {
    SessionKey::new(INSTANCE, SESSION)
}

/// Fixed agents, commands and files; file search matches by path prefix.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub agents: Vec<String>,
    pub commands: Vec<SlashCommandSpec>,
    pub files: Vec<FileCandidate>,
}

impl StaticSource {
    pub fn standard() -> Self {
        Self {
            agents: Vec::new(),
            commands: vec![
                SlashCommandSpec::new("review", Some("Review the working tree")),
                SlashCommandSpec::new("compact", Some("Summarize the conversation")),
            ],
            files: vec![
                file("src/", true),
                file("src/a.ts", false),
                file("src/b.ts", false),
                file("README.md", false),
            ],
        }
    }

    pub fn with_agents(mut self, agents: &[&str]) -> Self {
        self.agents = agents.iter().map(|name| name.to_string()).collect();
        self
    }
}

pub fn file(path: &str, is_directory: bool) -> FileCandidate {
    FileCandidate {
        path: path.to_string(),
        is_directory,
    }
}

impl PickerSource for StaticSource {
    fn agents(&self) -> Vec<String> {
        self.agents.clone()
    }

    fn commands(&self) -> Vec<SlashCommandSpec> {
        self.commands.clone()
    }

    fn search_files(&self, query: &str) -> Vec<FileCandidate> {
        let (dir, name) = match query.rfind('/') {
            Some(idx) => (&query[..=idx], &query[idx + 1..]),
            None => ("", query),
        };
        self.files
            .iter()
            .filter(|candidate| {
                let Some(rest) = candidate.path.strip_prefix(dir) else {
                    return false;
                };
                let rest = rest.trim_end_matches('/');
                !rest.is_empty() && !rest.contains('/') && rest.starts_with(name)
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Prompt {
        text: String,
        attachments: Vec<Attachment>,
    },
    Shell(String),
    Command {
        name: String,
        arguments: String,
    },
}

/// Records every call; fails each one while `fail_with` is set.
#[derive(Debug, Default)]
pub struct RecordingSender {
    pub sent: Vec<Sent>,
    pub fail_with: Option<String>,
}

impl RecordingSender {
    fn outcome(&self) -> Result<(), SendError> {
        match &self.fail_with {
            Some(message) => Err(SendError::new(message.clone())),
            None => Ok(()),
        }
    }
}

impl PromptSender for RecordingSender {
    fn send(&mut self, text: &str, attachments: &[Attachment]) -> Result<(), SendError> {
        self.sent.push(Sent::Prompt {
            text: text.to_string(),
            attachments: attachments.to_vec(),
        });
        self.outcome()
    }

    fn run_shell(&mut self, command: &str) -> Result<(), SendError> {
        self.sent.push(Sent::Shell(command.to_string()));
        self.outcome()
    }

    fn run_command(&mut self, name: &str, arguments: &str) -> Result<(), SendError> {
        self.sent.push(Sent::Command {
            name: name.to_string(),
            arguments: arguments.to_string(),
        });
        self.outcome()
    }
}

pub fn composer_with(store: Arc<MemoryStore>, source: StaticSource) -> Composer {
    let mut composer = Composer::with_store(ComposerConfig::default(), store, Box::new(source));
    composer.open_session(session_key());
    composer
}

pub fn composer() -> (Arc<MemoryStore>, Composer) {
    let store = Arc::new(MemoryStore::new());
    let composer = composer_with(store.clone(), StaticSource::standard());
    (store, composer)
}

pub fn press(composer: &mut Composer, key: Key) -> KeyOutcome {
    composer
        .handle_key(&KeyEvent::new(key))
        .expect("active session")
}

pub fn press_with(composer: &mut Composer, key: Key, modifiers: Modifiers) -> KeyOutcome {
    composer
        .handle_key(&KeyEvent::with_modifiers(key, modifiers))
        .expect("active session")
}

/// Types each character as its own key event.
pub fn type_text(composer: &mut Composer, text: &str) {
    for ch in text.chars() {
        let event = if ch == '\n' {
            KeyEvent::with_modifiers(Key::Enter, Modifiers::SHIFT)
        } else {
            KeyEvent::char(ch)
        };
        composer.handle_key(&event).expect("active session");
    }
}

pub fn text(composer: &Composer) -> String {
    composer.prompt().expect("active session")
}

pub fn long_text(lines: usize) -> String {
    (0..lines)
        .map(|idx| format!("line {idx} of a pasted block that is fairly long"))
        .collect::<Vec<_>>()
        .join("\n")
}
