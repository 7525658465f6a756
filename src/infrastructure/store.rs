//! Interfaces to the external services: document store, attachment store
//! and identity provider.

use crate::domain::{
    Collection, Direction, DocumentId, Entry, EntryDocument, OrderBy, Session, SortField,
};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// Equality filter supported by document queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    UserId(String),
}

impl Filter {
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Filter::UserId(user_id) => entry.user_id == *user_id,
        }
    }
}

/// Filters plus an optional single-field ordering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query scoped to one user's documents
    pub fn for_user(user_id: &str) -> Self {
        Query {
            filters: vec![Filter::UserId(user_id.to_string())],
            order_by: None,
        }
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Evaluate this query over an in-memory document set.
    ///
    /// Ties keep the input order, so callers pass documents in a stable order.
    pub fn apply(&self, documents: impl IntoIterator<Item = Entry>) -> Vec<Entry> {
        let mut matched: Vec<Entry> = documents
            .into_iter()
            .filter(|entry| self.filters.iter().all(|f| f.matches(entry)))
            .collect();

        if let Some(order) = self.order_by {
            matched.sort_by(|a, b| {
                let ordering = match order.field {
                    SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                    SortField::Rating => a.rating.cmp(&b.rating),
                };
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        matched
    }
}

/// Per-collection document storage. The store stamps `createdAt` on every write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its assigned identifier
    async fn insert(&self, collection: Collection, document: EntryDocument) -> Result<DocumentId>;

    /// Replace an existing document in place
    async fn update(
        &self,
        collection: Collection,
        id: &DocumentId,
        document: EntryDocument,
    ) -> Result<()>;

    /// Remove exactly one document; a missing id is an error
    async fn delete(&self, collection: Collection, id: &DocumentId) -> Result<()>;

    async fn get(&self, collection: Collection, id: &DocumentId) -> Result<Option<Entry>>;

    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Entry>>;
}

/// Blob storage addressed by path
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Stable URL for an uploaded path
    async fn download_url(&self, path: &str) -> Result<String>;

    /// Retrieve the payload behind a URL returned by `download_url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Account and session management
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn register(&self, email: &str, password: &str) -> Result<Session>;

    async fn send_password_reset(&self, email: &str) -> Result<()>;

    async fn sign_out(&self) -> Result<()>;

    async fn current_session(&self) -> Result<Option<Session>>;

    /// Receiver notified whenever the signed-in session changes
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}
