//! Browse entries use case

use crate::application::fetch_owned;
use crate::domain::{Collection, DocumentId, Entry, Session, SortOption};
use crate::error::Result;
use crate::infrastructure::{DocumentStore, Query};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Service for listing, searching and deleting final entries
pub struct BrowseService {
    documents: Arc<dyn DocumentStore>,
}

impl BrowseService {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        BrowseService { documents }
    }

    /// The session user's entries in the requested order
    pub async fn list(&self, session: &Session, sort: SortOption) -> Result<Vec<Entry>> {
        let query = Query::for_user(&session.user_id).order_by(sort.order_by());
        let entries = self.documents.query(Collection::Entries, &query).await?;
        debug!(user_id = %session.user_id, %sort, count = entries.len(), "listed entries");
        Ok(entries)
    }

    /// List, then narrow by a title search
    pub async fn list_matching(
        &self,
        session: &Session,
        sort: SortOption,
        term: &str,
    ) -> Result<Vec<Entry>> {
        let entries = self.list(session, sort).await?;
        Ok(search(entries, term))
    }

    pub async fn get_entry(&self, session: &Session, id: &DocumentId) -> Result<Entry> {
        fetch_owned(self.documents.as_ref(), Collection::Entries, session, id).await
    }

    /// Permanently delete one of the session user's entries
    pub async fn delete_entry(&self, session: &Session, id: &DocumentId) -> Result<()> {
        fetch_owned(self.documents.as_ref(), Collection::Entries, session, id).await?;
        self.documents.delete(Collection::Entries, id).await?;
        info!(%id, "deleted entry");
        Ok(())
    }
}

/// Keep entries whose display title contains `term`, ignoring case.
/// Order is preserved; an empty term keeps everything.
pub fn search(entries: Vec<Entry>, term: &str) -> Vec<Entry> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| entry.display_title().to_lowercase().contains(&needle))
        .collect()
}

/// Sum of ratings per calendar day
pub fn ratings_by_day(entries: &[Entry]) -> BTreeMap<NaiveDate, u32> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.created_date()).or_insert(0) += entry.rating.value() as u32;
    }
    totals
}
