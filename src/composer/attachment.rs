//! Attachment records referenced from the prompt buffer.

use std::fmt;
use std::path::Path;

use uuid::Uuid;

use crate::composer::placeholder::{
    format_image, format_mention, format_pasted, image_label, label_counter, pasted_label,
    CounterKind,
};

/// Opaque attachment identity, unique within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(String);

impl AttachmentId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttachmentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    File,
    Text,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    File {
        path: String,
        media_type: String,
        data: Option<Vec<u8>>,
        preview_url: Option<String>,
    },
    Text {
        value: String,
    },
    Agent {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    /// Chip label. Pasted text and images embed their counter here.
    pub display: String,
    /// Name used for `@filename` mention tokens.
    pub filename: String,
    pub source: AttachmentSource,
}

impl Attachment {
    #[must_use]
    pub fn pasted_text(counter: u32, value: impl Into<String>) -> Self {
        let value = value.into();
        let line_count = value.split('\n').count();
        Self {
            id: AttachmentId::generate(),
            display: pasted_label(counter, line_count),
            filename: format!("pasted-{counter}.txt"),
            source: AttachmentSource::Text { value },
        }
    }

    #[must_use]
    pub fn image(
        counter: u32,
        filename: impl Into<String>,
        media_type: impl Into<String>,
        data: Option<Vec<u8>>,
    ) -> Self {
        let filename = filename.into();
        Self {
            id: AttachmentId::generate(),
            display: image_label(counter),
            filename: filename.clone(),
            source: AttachmentSource::File {
                path: filename,
                media_type: media_type.into(),
                data,
                preview_url: None,
            },
        }
    }

    #[must_use]
    pub fn file(path: impl Into<String>, media_type: impl Into<String>) -> Self {
        let path = path.into();
        let display = Path::new(path.trim_end_matches('/'))
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.clone());
        Self {
            id: AttachmentId::generate(),
            display,
            filename: path.clone(),
            source: AttachmentSource::File {
                path,
                media_type: media_type.into(),
                data: None,
                preview_url: None,
            },
        }
    }

    #[must_use]
    pub fn agent(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: AttachmentId::generate(),
            display: name.clone(),
            filename: name.clone(),
            source: AttachmentSource::Agent { name },
        }
    }

    #[must_use]
    pub fn kind(&self) -> AttachmentKind {
        match self.source {
            AttachmentSource::File { .. } => AttachmentKind::File,
            AttachmentSource::Text { .. } => AttachmentKind::Text,
            AttachmentSource::Agent { .. } => AttachmentKind::Agent,
        }
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(
            &self.source,
            AttachmentSource::File { media_type, .. } if media_type.starts_with("image/")
        )
    }

    /// Counter embedded in the display label, for pasted text and images.
    #[must_use]
    pub fn counter(&self) -> Option<u32> {
        let (kind, counter) = label_counter(&self.display)?;
        match (kind, self.kind()) {
            (CounterKind::Pasted, AttachmentKind::Text) => Some(counter),
            (CounterKind::Image, AttachmentKind::File) if self.is_image() => Some(counter),
            _ => None,
        }
    }

    /// The buffer token that represents this attachment.
    #[must_use]
    pub fn token(&self) -> String {
        match (self.kind(), self.counter()) {
            (AttachmentKind::Text, Some(counter)) => format_pasted(counter),
            (AttachmentKind::File, Some(counter)) => format_image(counter),
            _ => format_mention(&self.filename),
        }
    }

    #[must_use]
    pub fn text_value(&self) -> Option<&str> {
        match &self.source {
            AttachmentSource::Text { value } => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match &self.source {
            AttachmentSource::File { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Media type from the file extension, `application/octet-stream` when unknown.
/// Paths ending in `/` are reported as directories.
#[must_use]
pub fn guess_media_type(path: &str) -> String {
    if path.ends_with('/') {
        return "inode/directory".to_string();
    }
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pasted_text_label_counts_lines() {
        let attachment = Attachment::pasted_text(3, "a\nb\nc");
        assert_eq!(attachment.display, "pasted #3 (3 lines)");
        assert_eq!(attachment.counter(), Some(3));
        assert_eq!(attachment.token(), "[pasted #3]");
    }

    #[test]
    fn image_token_uses_counter() {
        let attachment = Attachment::image(2, "shot.png", "image/png", Some(vec![1, 2]));
        assert!(attachment.is_image());
        assert_eq!(attachment.token(), "[Image #2]");
    }

    #[test]
    fn file_and_agent_tokens_are_mentions() {
        let file = Attachment::file("src/a.ts", "text/x-typescript");
        assert_eq!(file.display, "a.ts");
        assert_eq!(file.token(), "@src/a.ts");
        assert_eq!(file.counter(), None);

        let agent = Attachment::agent("reviewer");
        assert_eq!(agent.token(), "@reviewer");
    }

    #[test]
    fn media_type_guess() {
        assert_eq!(guess_media_type("shot.PNG"), "image/png");
        assert_eq!(guess_media_type("src/"), "inode/directory");
        assert_eq!(guess_media_type("Makefile"), "application/octet-stream");
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(AttachmentId::generate(), AttachmentId::generate());
    }
}
