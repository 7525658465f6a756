//! Entry buffer: the in-memory state of an entry being written

use crate::domain::attachment::Attachment;
use crate::domain::entry::{DocumentId, Draft, Rating};
use crate::error::{DaybookError, Result};

/// Content, rating and attachments accumulated before a save.
///
/// `draft_id` is the identifier of the draft this buffer was last saved to
/// (or loaded from); draft saves with an id update that document in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryBuffer {
    pub content: String,
    pub rating: Rating,
    pub attachments: Vec<Attachment>,
    pub draft_id: Option<DocumentId>,
}

impl EntryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a stored draft for further editing or promotion
    pub fn from_draft(draft: &Draft) -> Self {
        EntryBuffer {
            content: draft.content.clone(),
            rating: draft.rating,
            attachments: draft.files.iter().cloned().map(Attachment::Resolved).collect(),
            draft_id: Some(draft.id.clone()),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_rating(&mut self, rating: Rating) {
        self.rating = rating;
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Remove the attachment at `index`, if any
    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        if index < self.attachments.len() {
            Some(self.attachments.remove(index))
        } else {
            None
        }
    }

    pub fn pending_count(&self) -> usize {
        self.attachments.iter().filter(|a| a.is_pending()).count()
    }

    /// Checks required before a final save. Runs before any I/O.
    pub fn validate_final(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(DaybookError::Validation(
                "Entry text cannot be empty".to_string(),
            ));
        }
        if !self.rating.is_rated() {
            return Err(DaybookError::Validation(
                "Please rate the day from 1 to 5".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace all attachments with the URLs they resolved to
    pub fn mark_resolved(&mut self, urls: &[String]) {
        self.attachments = urls.iter().cloned().map(Attachment::Resolved).collect();
    }

    /// Clear the buffer after a successful final save
    pub fn reset(&mut self) {
        *self = EntryBuffer::default();
    }
}
