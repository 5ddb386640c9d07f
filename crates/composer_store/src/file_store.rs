use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::backend::{DraftBackend, DraftKey, HistoryBackend};
use crate::error::StoreError;
use crate::paths::{draft_file_path, history_file_path};
use crate::schema::{DraftRecord, HistoryRecord, RecordType};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// File-backed store rooted at a directory.
///
/// History is kept as one append-only JSONL file per scope. When a file grows
/// past twice the capacity it is rewritten with only the newest `capacity`
/// records.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    history_capacity: usize,
}

impl FileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_history_records(&self, path: &Path) -> Result<Vec<HistoryRecord>, StoreError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::io("opening history file", path, source)),
        };

        let mut records = Vec::new();
        for (line_index, line_result) in BufReader::new(file).lines().enumerate() {
            let line_number = line_index + 1;
            let line = line_result
                .map_err(|source| StoreError::io("reading history file", path, source))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str::<HistoryRecord>(&line)
                .map_err(|source| StoreError::json_line(path, line_number, source))?;
            if record.record_type != RecordType::History {
                return Err(StoreError::InvalidRecordType {
                    path: path.to_path_buf(),
                    line: line_number,
                    expected: "history",
                });
            }
            validate_rfc3339(path, line_number, "ts", &record.ts)?;
            records.push(record);
        }
        Ok(records)
    }

    fn rewrite_history(&self, path: &Path, records: &[HistoryRecord]) -> Result<(), StoreError> {
        let mut contents = String::new();
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|source| StoreError::json_serialize(path, source))?;
            contents.push_str(&line);
            contents.push('\n');
        }
        fs::write(path, contents).map_err(|source| StoreError::io("compacting history", path, source))
    }
}

impl HistoryBackend for FileStore {
    fn load_history(&self, scope: &str) -> Result<Vec<String>, StoreError> {
        let path = history_file_path(&self.root, scope)?;
        let records = self.read_history_records(&path)?;
        Ok(records
            .into_iter()
            .rev()
            .take(self.history_capacity)
            .map(|record| record.text)
            .collect())
    }

    fn add_to_history(&self, scope: &str, entry: &str) -> Result<(), StoreError> {
        let path = history_file_path(&self.root, scope)?;
        ensure_parent(&path)?;

        let record = HistoryRecord::new(now_rfc3339()?, entry);
        let line = serde_json::to_string(&record)
            .map_err(|source| StoreError::json_serialize(&path, source))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::io("opening history file for append", &path, source))?;
        writeln!(file, "{line}")
            .map_err(|source| StoreError::io("appending history record", &path, source))?;
        drop(file);

        let records = self.read_history_records(&path)?;
        if records.len() > self.history_capacity.saturating_mul(2) {
            let keep_from = records.len() - self.history_capacity;
            tracing::debug!(
                path = %path.display(),
                dropped = keep_from,
                "compacting history file"
            );
            self.rewrite_history(&path, &records[keep_from..])?;
        }
        Ok(())
    }
}

impl DraftBackend for FileStore {
    fn load_draft(&self, key: &DraftKey) -> Result<Option<String>, StoreError> {
        let path = draft_file_path(&self.root, key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::io("reading draft file", &path, source)),
        };
        let record = serde_json::from_str::<DraftRecord>(&raw)
            .map_err(|source| StoreError::json_line(&path, 1, source))?;
        if record.record_type != RecordType::Draft {
            return Err(StoreError::InvalidRecordType {
                path,
                line: 1,
                expected: "draft",
            });
        }
        validate_rfc3339(&path, 1, "updated_at", &record.updated_at)?;
        Ok(Some(record.text))
    }

    fn save_draft(&self, key: &DraftKey, text: &str) -> Result<(), StoreError> {
        let path = draft_file_path(&self.root, key)?;
        if text.is_empty() {
            return match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
                Err(source) => Err(StoreError::io("removing draft file", &path, source)),
            };
        }

        ensure_parent(&path)?;
        let record = DraftRecord::new(now_rfc3339()?, text);
        let json = serde_json::to_string(&record)
            .map_err(|source| StoreError::json_serialize(&path, source))?;
        fs::write(&path, json).map_err(|source| StoreError::io("writing draft file", &path, source))
    }
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| StoreError::io("creating store directory", parent, source))?;
    }
    Ok(())
}

fn now_rfc3339() -> Result<String, StoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(StoreError::ClockFormat)
}

pub(crate) fn validate_rfc3339(
    path: &Path,
    line_number: usize,
    field: &'static str,
    value: &str,
) -> Result<(), StoreError> {
    if OffsetDateTime::parse(value, &Rfc3339).is_err() {
        return Err(StoreError::InvalidTimestamp {
            path: path.to_path_buf(),
            line: line_number,
            field,
            value: value.to_string(),
        });
    }

    Ok(())
}
