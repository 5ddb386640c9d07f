//! Persistence for composer drafts and sent-prompt history.
//!
//! The composer treats every backend here as best-effort: a failed write is
//! logged by the caller and the in-memory state remains authoritative.

mod backend;
mod error;
mod file_store;
mod memory;
mod paths;
mod schema;

pub use backend::{DraftBackend, DraftKey, HistoryBackend};
pub use error::StoreError;
pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use paths::{draft_file_path, history_file_path, sanitize_key_component};
pub use schema::{DraftRecord, HistoryRecord, RecordType};
