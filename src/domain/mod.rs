//! Domain layer - Business logic and domain models

pub mod attachment;
pub mod buffer;
pub mod entry;
pub mod retention;
pub mod session;
pub mod sort;
pub mod text;

pub use attachment::Attachment;
pub use buffer::EntryBuffer;
pub use entry::{Collection, DocumentId, Draft, Entry, EntryDocument, Rating, SaveTarget};
pub use retention::RetentionWindow;
pub use session::Session;
pub use sort::{Direction, OrderBy, SortField, SortOption};
