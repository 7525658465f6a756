//! Application layer - Use cases and orchestration

pub mod auth;
pub mod browse;
pub mod drafts;
pub mod export;
pub mod init;
pub mod manage_config;
pub mod save_entry;

pub use auth::AuthService;
pub use browse::BrowseService;
pub use drafts::DraftService;
pub use export::{ExportFailure, ExportReport, ExportService};
pub use manage_config::ConfigService;
pub use save_entry::SaveEntryService;

use crate::domain::{Collection, DocumentId, Entry, Session};
use crate::error::{DaybookError, Result};
use crate::infrastructure::{AttachmentStore, Config, DocumentStore, IdentityProvider};
use std::sync::Arc;

/// All journal services wired to one backend
pub struct Daybook {
    pub auth: AuthService,
    pub entries: SaveEntryService,
    pub drafts: DraftService,
    pub browse: BrowseService,
    pub export: ExportService,
}

impl Daybook {
    /// Build every service on top of `backend`, applying the retention and
    /// promotion settings from `config`
    pub fn new<B>(backend: Arc<B>, config: &Config) -> Self
    where
        B: DocumentStore + AttachmentStore + IdentityProvider + 'static,
    {
        let documents: Arc<dyn DocumentStore> = backend.clone();
        let attachments: Arc<dyn AttachmentStore> = backend.clone();
        let identity: Arc<dyn IdentityProvider> = backend;

        Daybook {
            auth: AuthService::new(identity),
            entries: SaveEntryService::new(documents.clone(), attachments.clone())
                .with_promotion_policy(config.on_promote),
            drafts: DraftService::new(documents.clone()).with_retention(config.retention()),
            browse: BrowseService::new(documents),
            export: ExportService::new(attachments),
        }
    }
}

/// Fetch a document and check that it belongs to the session user.
/// A foreign document is reported exactly like a missing one.
pub(crate) async fn fetch_owned(
    documents: &dyn DocumentStore,
    collection: Collection,
    session: &Session,
    id: &DocumentId,
) -> Result<Entry> {
    match documents.get(collection, id).await? {
        Some(entry) if entry.is_owned_by(&session.user_id) => Ok(entry),
        _ => Err(DaybookError::Persistence(format!(
            "No document '{}' in {}",
            id, collection
        ))),
    }
}
