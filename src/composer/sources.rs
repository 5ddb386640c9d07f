//! Mention and slash-command candidates.

use std::fs::{read_dir, symlink_metadata};
use std::path::PathBuf;

use crate::composer::picker::{PickerItem, PickerMode};
use crate::core::fuzzy::fuzzy_rank;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashCommandSpec {
    pub name: String,
    pub description: Option<String>,
}

impl SlashCommandSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Workspace-relative path; directories end with `/`.
    pub path: String,
    pub is_directory: bool,
}

/// Data the picker queries but does not own.
pub trait PickerSource {
    fn agents(&self) -> Vec<String>;

    fn commands(&self) -> Vec<SlashCommandSpec>;

    fn search_files(&self, query: &str) -> Vec<FileCandidate>;

    fn is_command(&self, name: &str) -> bool {
        self.commands().iter().any(|command| command.name == name)
    }
}

/// Candidates for the current picker mode and query.
#[must_use]
pub fn candidates(source: &dyn PickerSource, mode: PickerMode, query: &str) -> Vec<PickerItem> {
    match mode {
        PickerMode::Command => fuzzy_rank(source.commands(), query, |command| command.name.clone())
            .into_iter()
            .map(|command| PickerItem::Command {
                name: command.name,
                description: command.description,
            })
            .collect(),
        PickerMode::Mention => {
            let mut items: Vec<PickerItem> = Vec::new();
            if !query.contains('/') {
                items.extend(
                    fuzzy_rank(source.agents(), query, |name| name.clone())
                        .into_iter()
                        .map(|name| PickerItem::Agent { name }),
                );
            }
            items.extend(
                source
                    .search_files(query)
                    .into_iter()
                    .map(|file| PickerItem::File {
                        path: file.path,
                        is_directory: file.is_directory,
                    }),
            );
            items
        }
    }
}

/// Lists agents and commands from memory and files from one directory level
/// of the workspace, like shell completion.
#[derive(Debug, Clone)]
pub struct WorkspacePickerSource {
    base_path: PathBuf,
    agents: Vec<String>,
    commands: Vec<SlashCommandSpec>,
    max_results: usize,
}

impl WorkspacePickerSource {
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            agents: Vec::new(),
            commands: Vec::new(),
            max_results: 50,
        }
    }

    #[must_use]
    pub fn with_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agents = agents.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_commands(mut self, commands: Vec<SlashCommandSpec>) -> Self {
        self.commands = commands;
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }
}

fn split_query(query: &str) -> (&str, &str) {
    match query.rfind('/') {
        Some(idx) => (&query[..=idx], &query[idx + 1..]),
        None => ("", query),
    }
}

impl PickerSource for WorkspacePickerSource {
    fn agents(&self) -> Vec<String> {
        self.agents.clone()
    }

    fn commands(&self) -> Vec<SlashCommandSpec> {
        self.commands.clone()
    }

    fn search_files(&self, query: &str) -> Vec<FileCandidate> {
        let (dir_prefix, name_query) = split_query(query);
        if dir_prefix.starts_with('/') || dir_prefix.split('/').any(|part| part == "..") {
            return Vec::new();
        }
        let search_dir = self.base_path.join(dir_prefix);

        let entries = match read_dir(&search_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %search_dir.display(), error = %err, "file search skipped");
                return Vec::new();
            }
        };

        let mut found = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') && !name_query.starts_with('.') {
                continue;
            }

            let mut is_directory = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            if !is_directory {
                if let Ok(metadata) = symlink_metadata(entry.path()) {
                    if metadata.file_type().is_symlink() {
                        if let Ok(target) = entry.path().metadata() {
                            is_directory = target.is_dir();
                        }
                    }
                }
            }

            let mut path = format!("{dir_prefix}{name}");
            if is_directory {
                path.push('/');
            }
            found.push((name, FileCandidate { path, is_directory }));
        }

        // Directories first, then by name, before fuzzy ranking reorders.
        found.sort_by(|(a_name, a), (b_name, b)| {
            b.is_directory
                .cmp(&a.is_directory)
                .then_with(|| a_name.cmp(b_name))
        });

        fuzzy_rank(found, name_query, |(name, _)| name.clone())
            .into_iter()
            .take(self.max_results)
            .map(|(_, candidate)| candidate)
            .collect()
    }
}
