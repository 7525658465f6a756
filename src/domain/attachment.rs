//! Attachments held by the entry buffer

use chrono::{DateTime, Utc};
use std::fmt;

/// Timestamp layout that prefixes every upload name of a save transaction
const UPLOAD_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S%.3f";

/// A file attached to an entry: either still local or already uploaded
#[derive(Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Raw payload waiting to be uploaded
    Pending { name: String, bytes: Vec<u8> },
    /// Download URL returned by the attachment store
    Resolved(String),
}

impl Attachment {
    pub fn pending(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Attachment::Pending {
            name: name.into(),
            bytes,
        }
    }

    pub fn resolved(url: impl Into<String>) -> Self {
        Attachment::Resolved(url.into())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Attachment::Pending { .. })
    }

    /// Name shown to the user
    pub fn display_name(&self) -> String {
        match self {
            Attachment::Pending { name, .. } => name.clone(),
            Attachment::Resolved(url) => file_name_from_url(url),
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attachment::Pending { name, bytes } => f
                .debug_struct("Pending")
                .field("name", name)
                .field("len", &bytes.len())
                .finish(),
            Attachment::Resolved(url) => f.debug_tuple("Resolved").field(url).finish(),
        }
    }
}

/// Identifies the uploads of one save transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    user_id: String,
    stamp: DateTime<Utc>,
    token: String,
}

impl UploadBatch {
    /// Start a batch for `user_id` with a fresh random token
    pub fn start(user_id: &str, stamp: DateTime<Utc>) -> Self {
        let token = uuid::Uuid::new_v4().simple().to_string();
        Self::with_token(user_id, stamp, &token[..8])
    }

    pub fn with_token(user_id: &str, stamp: DateTime<Utc>, token: &str) -> Self {
        UploadBatch {
            user_id: user_id.to_string(),
            stamp,
            token: token.to_string(),
        }
    }

    /// Storage path for the `index`-th attachment of the batch.
    ///
    /// Layout is `<prefix>/<user>/<stamp>_<token>_<index>_<name>`. Paths of
    /// different users never overlap, and within one user the millisecond
    /// stamp and the random token separate transactions.
    pub fn upload_path(&self, prefix: &str, index: usize, name: &str) -> String {
        format!(
            "{}/{}/{}_{}_{}_{}",
            prefix,
            sanitize_file_name(&self.user_id),
            self.stamp.format(UPLOAD_STAMP_FORMAT),
            self.token,
            index,
            sanitize_file_name(name)
        )
    }
}

/// Decoded last path segment of a URL, without query string
pub fn file_name_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("attachment");

    // Some stores encode the whole object path into one segment
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());

    decoded
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("attachment")
        .to_string()
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();

    if cleaned.trim().is_empty() {
        "attachment".to_string()
    } else {
        cleaned
    }
}
