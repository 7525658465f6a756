//! Journal entries, drafts and the document shape shared by both collections

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier assigned by the document store on insert
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        DocumentId(id.into())
    }

    /// Fresh random identifier, used by the bundled stores
    pub fn generate() -> Self {
        DocumentId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        DocumentId(value.to_string())
    }
}

/// Mood rating from 0 to 5, where 0 means "unrated"
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const UNRATED: Rating = Rating(0);
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, String> {
        if value > Self::MAX {
            return Err(format!(
                "Invalid rating: {}. Ratings go from 0 (unrated) to {}",
                value,
                Self::MAX
            ));
        }
        Ok(Rating(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// A final entry needs a rating in 1..=5
    pub fn is_rated(self) -> bool {
        self.0 >= 1
    }

    pub fn stars(self) -> String {
        "⭐".repeat(self.0 as usize)
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Where a save request lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    Final,
    Draft,
}

impl SaveTarget {
    pub fn collection(self) -> Collection {
        match self {
            SaveTarget::Final => Collection::Entries,
            SaveTarget::Draft => Collection::Drafts,
        }
    }

    /// Attachment store folder for uploads made by this kind of save
    pub fn upload_prefix(self) -> &'static str {
        match self {
            SaveTarget::Final => "uploads",
            SaveTarget::Draft => "drafts",
        }
    }
}

/// The two document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Entries,
    Drafts,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Entries => "entries",
            Collection::Drafts => "drafts",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Document body as written to the store. `createdAt` is stamped by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDocument {
    pub user_id: String,
    pub content: String,
    pub rating: Rating,
    pub files: Vec<String>,
    pub is_draft: bool,
}

/// A persisted journal record read back from either collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: DocumentId,
    pub user_id: String,
    pub content: String,
    pub rating: Rating,
    #[serde(default)]
    pub files: Vec<String>,
    pub is_draft: bool,
    pub created_at: DateTime<Utc>,
}

/// Drafts share the entry shape; they live in the drafts collection
pub type Draft = Entry;

impl Entry {
    pub fn from_document(id: DocumentId, document: EntryDocument, created_at: DateTime<Utc>) -> Self {
        Entry {
            id,
            user_id: document.user_id,
            content: document.content,
            rating: document.rating,
            files: document.files,
            is_draft: document.is_draft,
            created_at,
        }
    }

    /// Calendar day of creation in local time
    pub fn created_date(&self) -> NaiveDate {
        self.created_at.with_timezone(&Local).date_naive()
    }

    /// Title shown in listings and used by search (e.g. "October 19, 2026")
    pub fn display_title(&self) -> String {
        self.created_date().format("%B %d, %Y").to_string()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
