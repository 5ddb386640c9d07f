use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    History,
    Draft,
}

/// One line of a history JSONL file. Lines are appended oldest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub ts: String,
    pub text: String,
}

impl HistoryRecord {
    #[must_use]
    pub fn new(ts: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            record_type: RecordType::History,
            ts: ts.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraftRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub updated_at: String,
    pub text: String,
}

impl DraftRecord {
    #[must_use]
    pub fn new(updated_at: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            record_type: RecordType::Draft,
            updated_at: updated_at.into(),
            text: text.into(),
        }
    }
}
