//! Ordered, session-scoped attachment collection.

use crate::composer::attachment::{Attachment, AttachmentId, AttachmentKind};
use crate::composer::placeholder::{
    loose_mention_pattern, loose_placeholder_pattern, CounterKind,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentLedger {
    items: Vec<Attachment>,
}

impl AttachmentLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attachment: Attachment) -> AttachmentId {
        let id = attachment.id.clone();
        tracing::debug!(id = %id, display = %attachment.display, "attachment added");
        self.items.push(attachment);
        id
    }

    /// Removes by id. The buffer is left alone; callers strip the token.
    pub fn remove(&mut self, id: &AttachmentId) -> Option<Attachment> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        let removed = self.items.remove(index);
        tracing::debug!(id = %id, display = %removed.display, "attachment removed");
        Some(removed)
    }

    #[must_use]
    pub fn list(&self) -> &[Attachment] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &AttachmentId) -> Option<&Attachment> {
        self.items.iter().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn replace_all(&mut self, attachments: Vec<Attachment>) {
        self.items = attachments;
    }

    /// Text attachment whose label carries `counter`.
    #[must_use]
    pub fn find_pasted(&self, counter: u32) -> Option<&Attachment> {
        self.items
            .iter()
            .find(|item| item.kind() == AttachmentKind::Text && item.counter() == Some(counter))
    }

    /// Image attachment whose label carries `counter`.
    #[must_use]
    pub fn find_image(&self, counter: u32) -> Option<&Attachment> {
        self.items
            .iter()
            .find(|item| item.is_image() && item.counter() == Some(counter))
    }

    /// File or agent attachment referenced by `@name`.
    #[must_use]
    pub fn find_mention(&self, name: &str) -> Option<&Attachment> {
        self.items.iter().find(|item| {
            item.counter().is_none()
                && matches!(item.kind(), AttachmentKind::File | AttachmentKind::Agent)
                && item.filename == name
        })
    }

    /// Drops every attachment whose token no longer appears in `buffer`.
    ///
    /// Idempotent; returns the removed attachments, empty when the ledger
    /// already agrees with the buffer.
    pub fn reconcile(&mut self, buffer: &str) -> Vec<Attachment> {
        let (kept, dropped): (Vec<Attachment>, Vec<Attachment>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|attachment| token_present(attachment, buffer));
        self.items = kept;
        for attachment in &dropped {
            tracing::debug!(
                id = %attachment.id,
                display = %attachment.display,
                "attachment token left the buffer; dropping"
            );
        }
        dropped
    }
}

fn token_present(attachment: &Attachment, buffer: &str) -> bool {
    let pattern = match (attachment.kind(), attachment.counter()) {
        (AttachmentKind::Text, Some(counter)) => {
            loose_placeholder_pattern(CounterKind::Pasted, counter)
        }
        (AttachmentKind::File, Some(counter)) => {
            loose_placeholder_pattern(CounterKind::Image, counter)
        }
        _ => loose_mention_pattern(&attachment.filename),
    };
    match pattern {
        Some(pattern) => pattern.is_match(buffer),
        // Unbuildable pattern: fall back to an exact substring check.
        None => buffer.contains(&attachment.token()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ledger_with(items: Vec<Attachment>) -> AttachmentLedger {
        let mut ledger = AttachmentLedger::new();
        for item in items {
            ledger.add(item);
        }
        ledger
    }

    #[test]
    fn remove_returns_attachment_and_keeps_order() {
        let first = Attachment::agent("one");
        let second = Attachment::agent("two");
        let third = Attachment::agent("three");
        let second_id = second.id.clone();
        let mut ledger = ledger_with(vec![first, second, third]);

        let removed = ledger.remove(&second_id).expect("present");
        assert_eq!(removed.filename, "two");
        let names: Vec<&str> = ledger.list().iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["one", "three"]);
        assert!(ledger.remove(&second_id).is_none());
    }

    #[test]
    fn reconcile_drops_missing_tokens_only() {
        let mut ledger = ledger_with(vec![
            Attachment::pasted_text(1, "long"),
            Attachment::pasted_text(2, "longer"),
            Attachment::file("src/a.ts", "text/plain"),
            Attachment::agent("reviewer"),
        ]);

        let dropped = ledger.reconcile("[pasted #2] ask @reviewer about @src/a.ts");
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].counter(), Some(1));
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut ledger = ledger_with(vec![Attachment::pasted_text(1, "x")]);
        assert!(ledger.reconcile("[pasted #1]").is_empty());
        assert!(ledger.reconcile("[pasted #1]").is_empty());
        assert_eq!(ledger.reconcile("").len(), 1);
        assert!(ledger.reconcile("").is_empty());
    }

    #[test]
    fn reconcile_tolerates_whitespace_drift() {
        let mut ledger = ledger_with(vec![Attachment::image(3, "a.png", "image/png", None)]);
        assert!(ledger.reconcile("see [ image #3 ]").is_empty());
        assert_eq!(ledger.reconcile("see [image #").len(), 1);
    }

    #[test]
    fn lookups_by_counter_and_mention() {
        let ledger = ledger_with(vec![
            Attachment::pasted_text(4, "x"),
            Attachment::image(4, "b.png", "image/png", None),
            Attachment::file("src/b.rs", "text/x-rust"),
        ]);
        assert!(ledger.find_pasted(4).is_some());
        assert!(ledger.find_image(4).is_some());
        assert!(ledger.find_pasted(5).is_none());
        assert_eq!(
            ledger.find_mention("src/b.rs").map(|a| a.display.as_str()),
            Some("b.rs")
        );
        assert!(ledger.find_mention("b.png").is_none());
    }
}
