//! Save entry use case
//!
//! Decides whether a save lands in the entries or the drafts collection,
//! uploads pending attachments, and writes the document.

use crate::application::fetch_owned;
use crate::domain::attachment::UploadBatch;
use crate::domain::{Attachment, Collection, DocumentId, EntryBuffer, EntryDocument, SaveTarget, Session};
use crate::error::{DaybookError, Result};
use crate::infrastructure::{AttachmentStore, DocumentStore, PromotionPolicy};
use chrono::Utc;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Service for persisting entries and drafts
pub struct SaveEntryService {
    documents: Arc<dyn DocumentStore>,
    attachments: Arc<dyn AttachmentStore>,
    on_promote: PromotionPolicy,
}

impl SaveEntryService {
    pub fn new(documents: Arc<dyn DocumentStore>, attachments: Arc<dyn AttachmentStore>) -> Self {
        SaveEntryService {
            documents,
            attachments,
            on_promote: PromotionPolicy::default(),
        }
    }

    pub fn with_promotion_policy(mut self, policy: PromotionPolicy) -> Self {
        self.on_promote = policy;
        self
    }

    /// Persist `buffer` and return the document identifier.
    ///
    /// Final saves are validated before any I/O. Draft saves with
    /// `existing_draft_id` update that draft in place; everything else inserts
    /// a new document.
    ///
    /// # Errors
    ///
    /// - `Validation` for a final save with empty content or no rating
    /// - `AttachmentUpload` if any pending attachment fails to upload; no
    ///   document is written in that case
    /// - `Persistence` if the document write fails or the draft is unknown
    pub async fn save(
        &self,
        session: &Session,
        buffer: &EntryBuffer,
        target: SaveTarget,
        existing_draft_id: Option<&DocumentId>,
    ) -> Result<DocumentId> {
        let (id, _) = self
            .save_resolved(session, buffer, target, existing_draft_id)
            .await?;
        Ok(id)
    }

    /// Save the buffer the way the editor does.
    ///
    /// Draft saves reuse and record `buffer.draft_id` and swap pending
    /// attachments for their URLs. Final saves apply the promotion policy to
    /// the draft the buffer came from, then clear the buffer.
    pub async fn save_buffer(
        &self,
        session: &Session,
        buffer: &mut EntryBuffer,
        target: SaveTarget,
    ) -> Result<DocumentId> {
        let existing = match target {
            SaveTarget::Draft => buffer.draft_id.clone(),
            SaveTarget::Final => None,
        };

        let (id, files) = self
            .save_resolved(session, buffer, target, existing.as_ref())
            .await?;

        match target {
            SaveTarget::Draft => {
                buffer.draft_id = Some(id.clone());
                buffer.mark_resolved(&files);
            }
            SaveTarget::Final => {
                if let Some(draft_id) = buffer.draft_id.as_ref() {
                    self.promote(draft_id).await;
                }
                buffer.reset();
            }
        }

        Ok(id)
    }

    async fn save_resolved(
        &self,
        session: &Session,
        buffer: &EntryBuffer,
        target: SaveTarget,
        existing_draft_id: Option<&DocumentId>,
    ) -> Result<(DocumentId, Vec<String>)> {
        if target == SaveTarget::Final {
            buffer.validate_final()?;
        }

        let update_id = match (target, existing_draft_id) {
            (SaveTarget::Draft, Some(id)) => {
                fetch_owned(self.documents.as_ref(), Collection::Drafts, session, id).await?;
                Some(id)
            }
            _ => None,
        };

        let files = self
            .resolve_attachments(session, &buffer.attachments, target)
            .await?;

        let document = EntryDocument {
            user_id: session.user_id.clone(),
            content: buffer.content.clone(),
            rating: buffer.rating,
            files: files.clone(),
            is_draft: target == SaveTarget::Draft,
        };

        let id = match update_id {
            Some(id) => {
                self.documents
                    .update(Collection::Drafts, id, document)
                    .await?;
                id.clone()
            }
            None => self.documents.insert(target.collection(), document).await?,
        };

        info!(
            collection = %target.collection(),
            %id,
            files = files.len(),
            updated = update_id.is_some(),
            "saved journal document"
        );
        Ok((id, files))
    }

    /// Upload every pending attachment concurrently and return the URLs in
    /// buffer order. The first failure fails the whole batch.
    async fn resolve_attachments(
        &self,
        session: &Session,
        attachments: &[Attachment],
        target: SaveTarget,
    ) -> Result<Vec<String>> {
        let batch = UploadBatch::start(&session.user_id, Utc::now());
        let batch = &batch;
        let prefix = target.upload_prefix();

        let uploads = attachments
            .iter()
            .enumerate()
            .map(|(index, attachment)| async move {
                match attachment {
                    Attachment::Resolved(url) => Ok::<_, DaybookError>(url.clone()),
                    Attachment::Pending { name, bytes } => {
                        let path = batch.upload_path(prefix, index, name);
                        self.attachments
                            .upload(&path, bytes)
                            .await
                            .map_err(|e| upload_error(name, e))?;
                        let url = self
                            .attachments
                            .download_url(&path)
                            .await
                            .map_err(|e| upload_error(name, e))?;
                        debug!(%path, "uploaded attachment");
                        Ok::<_, DaybookError>(url)
                    }
                }
            });

        try_join_all(uploads).await
    }

    /// Apply the promotion policy to the draft a final entry was written from.
    /// The entry already exists, so failures here are logged, not returned.
    async fn promote(&self, draft_id: &DocumentId) {
        if self.on_promote != PromotionPolicy::Delete {
            return;
        }
        match self.documents.delete(Collection::Drafts, draft_id).await {
            Ok(()) => info!(%draft_id, "removed promoted draft"),
            Err(e) => warn!(%draft_id, error = %e, "could not remove promoted draft"),
        }
    }
}

fn upload_error(name: &str, error: DaybookError) -> DaybookError {
    DaybookError::AttachmentUpload {
        name: name.to_string(),
        reason: error.to_string(),
    }
}
