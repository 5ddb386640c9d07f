use std::fmt;

use composer_store::DraftKey;
use thiserror::Error;

use crate::composer::attachment::AttachmentId;

/// Failure reported by a send or shell-run collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendError {
    message: String,
}

impl SendError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SendError {}

impl From<String> for SendError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for SendError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("a send is already in flight")]
    SendInFlight,

    #[error("nothing to send")]
    EmptyPrompt,

    #[error("no open session for instance {} / session {}", .0.instance_id, .0.session_id)]
    UnknownSession(DraftKey),

    #[error("no active session")]
    NoActiveSession,

    #[error("no attachment with id {0}")]
    UnknownAttachment(AttachmentId),

    #[error("attachment {0} does not hold pasted text")]
    NotTextAttachment(AttachmentId),

    #[error("send failed: {0}")]
    Send(#[from] SendError),
}

/// User-visible notice raised by a failed send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerAlert {
    pub title: String,
    pub detail: String,
}

impl ComposerAlert {
    #[must_use]
    pub fn send_failed(error: &SendError) -> Self {
        Self {
            title: "Failed to send prompt".to_string(),
            detail: error.message().to_string(),
        }
    }
}
