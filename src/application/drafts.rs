//! Draft lifecycle use case

use crate::application::fetch_owned;
use crate::domain::{Collection, DocumentId, Draft, EntryBuffer, RetentionWindow, Session, SortOption};
use crate::error::{DaybookError, Result};
use crate::infrastructure::{DocumentStore, Query};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Service for listing and removing drafts.
///
/// Every query and delete is scoped to the session's user. Expired drafts
/// are hidden from listings and cannot be opened, but stay in storage until
/// deleted.
pub struct DraftService {
    documents: Arc<dyn DocumentStore>,
    retention: RetentionWindow,
}

impl DraftService {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        DraftService {
            documents,
            retention: RetentionWindow::default(),
        }
    }

    pub fn with_retention(mut self, retention: RetentionWindow) -> Self {
        self.retention = retention;
        self
    }

    pub fn retention(&self) -> RetentionWindow {
        self.retention
    }

    /// Drafts of the session user still inside the retention window, newest first
    pub async fn list_active_drafts(&self, session: &Session) -> Result<Vec<Draft>> {
        self.list_active_drafts_at(session, Utc::now()).await
    }

    /// Same as [`list_active_drafts`](Self::list_active_drafts) against an explicit clock
    pub async fn list_active_drafts_at(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Vec<Draft>> {
        let drafts = self.list_all_drafts(session).await?;
        let total = drafts.len();

        let active: Vec<Draft> = drafts
            .into_iter()
            .filter(|draft| self.retention.is_active(draft.created_at, now))
            .collect();

        debug!(
            user_id = %session.user_id,
            active = active.len(),
            expired = total - active.len(),
            "listed drafts"
        );
        Ok(active)
    }

    /// Load one of the session user's drafts into a fresh buffer.
    ///
    /// An expired draft is reported like a missing one.
    pub async fn open_draft(&self, session: &Session, id: &DocumentId) -> Result<EntryBuffer> {
        self.open_draft_at(session, id, Utc::now()).await
    }

    /// Same as [`open_draft`](Self::open_draft) against an explicit clock
    pub async fn open_draft_at(
        &self,
        session: &Session,
        id: &DocumentId,
        now: DateTime<Utc>,
    ) -> Result<EntryBuffer> {
        let draft = fetch_owned(self.documents.as_ref(), Collection::Drafts, session, id).await?;
        if !self.retention.is_active(draft.created_at, now) {
            debug!(%id, "refused to open expired draft");
            return Err(DaybookError::Persistence(format!("Draft '{}' has expired", id)));
        }
        Ok(EntryBuffer::from_draft(&draft))
    }

    /// Delete exactly one draft owned by the session user
    pub async fn delete_draft(&self, session: &Session, id: &DocumentId) -> Result<()> {
        fetch_owned(self.documents.as_ref(), Collection::Drafts, session, id).await?;
        self.documents.delete(Collection::Drafts, id).await?;
        info!(%id, "deleted draft");
        Ok(())
    }

    /// Delete every draft of the session user, expired ones included.
    ///
    /// Deletions run concurrently and all of them are awaited. Failures do not
    /// roll back the deletions that succeeded; they are reported together as
    /// [`DaybookError::BulkDelete`]. Returns the number of drafts deleted.
    pub async fn clear_all_drafts(&self, session: &Session) -> Result<usize> {
        let drafts = self.list_all_drafts(session).await?;

        let deletions = drafts.iter().map(|draft| async move {
            let result = self.documents.delete(Collection::Drafts, &draft.id).await;
            (&draft.id, result)
        });

        let mut deleted = 0;
        let mut failures = Vec::new();
        for (id, result) in join_all(deletions).await {
            match result {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(%id, error = %e, "draft delete failed");
                    failures.push(format!("{}: {}", id, e));
                }
            }
        }

        if failures.is_empty() {
            info!(deleted, "cleared drafts");
            Ok(deleted)
        } else {
            Err(DaybookError::BulkDelete { deleted, failures })
        }
    }

    async fn list_all_drafts(&self, session: &Session) -> Result<Vec<Draft>> {
        let query = Query::for_user(&session.user_id).order_by(SortOption::Newest.order_by());
        self.documents.query(Collection::Drafts, &query).await
    }
}
