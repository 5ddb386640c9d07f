use std::path::{Path, PathBuf};

use crate::backend::DraftKey;
use crate::error::StoreError;

pub const HISTORY_DIR: &str = "history";
pub const DRAFT_DIR: &str = "drafts";

/// Maps an arbitrary key onto a single safe path component.
#[must_use]
pub fn sanitize_key_component(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' | ' ' | '\t' | '\n' | '\r' | '.' => '-',
            _ => c,
        })
        .collect()
}

fn checked_component(key: &str) -> Result<String, StoreError> {
    let sanitized = sanitize_key_component(key);
    if sanitized.chars().all(|c| c == '-') {
        return Err(StoreError::InvalidScopeKey {
            key: key.to_string(),
        });
    }
    Ok(sanitized)
}

pub fn history_file_path(root: &Path, scope: &str) -> Result<PathBuf, StoreError> {
    let name = checked_component(scope)?;
    Ok(root.join(HISTORY_DIR).join(format!("{name}.jsonl")))
}

pub fn draft_file_path(root: &Path, key: &DraftKey) -> Result<PathBuf, StoreError> {
    let instance = checked_component(&key.instance_id)?;
    let session = checked_component(&key.session_id)?;
    Ok(root
        .join(DRAFT_DIR)
        .join(instance)
        .join(format!("{session}.json")))
}
