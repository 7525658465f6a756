//! Error types for daybook

use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds reported by an identity provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email address is already registered")]
    EmailInUse,

    #[error("{0}")]
    Other(String),
}

/// Main error type for daybook
#[derive(Debug, Error)]
pub enum DaybookError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Attachment upload failed for '{name}': {reason}")]
    AttachmentUpload { name: String, reason: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Deleted {deleted} draft(s), {} failed: {}", .failures.len(), .failures.join("; "))]
    BulkDelete {
        deleted: usize,
        failures: Vec<String>,
    },

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Not a daybook directory: {0}")]
    NotDaybookDirectory(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl DaybookError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DaybookError::NotDaybookDirectory(_) => 2,
            DaybookError::Validation(_) => 3,
            DaybookError::Auth(_) | DaybookError::NotAuthenticated => 4,
            DaybookError::AttachmentUpload { .. }
            | DaybookError::Persistence(_)
            | DaybookError::BulkDelete { .. } => 5,
            _ => 1,
        }
    }

    /// True for failures reported by the document or attachment store
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            DaybookError::Persistence(_) | DaybookError::BulkDelete { .. }
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            DaybookError::NotDaybookDirectory(path) => {
                format!(
                    "Not a daybook directory: {}\n\n\
                    Suggestions:\n\
                    • Run 'daybook init' in this directory to create a new journal\n\
                    • Navigate to an existing daybook directory\n\
                    • Set DAYBOOK_ROOT environment variable to your journal path",
                    path.display()
                )
            }
            DaybookError::Validation(msg) => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Entries need some text and a rating from 1 to 5\n\
                    • Use 'daybook write --draft' to keep an incomplete entry",
                    msg
                )
            }
            DaybookError::NotAuthenticated => "Not signed in\n\n\
                Suggestions:\n\
                • Sign in with 'daybook login <email>'\n\
                • Create an account with 'daybook register <email>'"
                .to_string(),
            DaybookError::Auth(AuthError::EmailInUse) => format!(
                "{}\n\n\
                Suggestions:\n\
                • Sign in with 'daybook login <email>'\n\
                • Use 'daybook reset-password <email>' if you forgot the password",
                self
            ),
            DaybookError::Config(msg) => {
                if msg.contains("on_promote") {
                    format!(
                        "{}\n\n\
                        Valid values: keep, delete\n\
                        Example: daybook config on_promote delete",
                        msg
                    )
                } else if msg.contains("sort") {
                    format!(
                        "{}\n\n\
                        Valid sort options: newest, oldest, highest, lowest\n\
                        Example: daybook list --sort highest",
                        msg
                    )
                } else {
                    msg.clone()
                }
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using DaybookError
pub type Result<T> = std::result::Result<T, DaybookError>;
