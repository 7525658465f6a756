//! Infrastructure layer - External services, storage backends and configuration

pub mod config;
pub mod memory;
pub mod password;
pub mod repository;
pub mod store;

pub use config::{Config, PromotionPolicy};
pub use memory::{CallCounts, MemoryBackend};
pub use repository::{JournalRepository, LocalBackend};
pub use store::{AttachmentStore, DocumentStore, Filter, IdentityProvider, Query};
