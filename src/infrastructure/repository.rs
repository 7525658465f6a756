//! Local directory backend
//!
//! Stores everything under `<root>/.daybook/`:
//!
//! - `config.toml`        journal configuration
//! - `entries/<id>.json`  final entries
//! - `drafts/<id>.json`   drafts
//! - `attachments/...`    uploaded files, addressed by `file://` URLs
//! - `users.toml`         accounts with Argon2id password hashes
//! - `session.toml`       the signed-in session, if any

use crate::domain::{Collection, DocumentId, Entry, EntryDocument, Session};
use crate::error::{AuthError, DaybookError, Result};
use crate::infrastructure::config::{Config, DAYBOOK_DIR};
use crate::infrastructure::password::{hash_password, validate_password_strength, verify_password};
use crate::infrastructure::store::{AttachmentStore, DocumentStore, IdentityProvider, Query};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const FILE_URL_PREFIX: &str = "file://";

/// Abstract repository for journal configuration
pub trait JournalRepository {
    /// Get the root directory of this repository
    fn root(&self) -> &Path;

    /// Load configuration from .daybook/config.toml
    fn load_config(&self) -> Result<Config>;

    /// Save configuration to .daybook/config.toml
    fn save_config(&self, config: &Config) -> Result<()>;

    /// Check if .daybook directory exists
    fn is_initialized(&self) -> bool;

    /// Create .daybook directory structure
    fn initialize(&self) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    email: String,
    user_id: String,
    password_hash: String,
    created: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserFile {
    #[serde(default, rename = "user")]
    users: Vec<UserRecord>,
}

/// File system implementation of the journal services
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
    session: watch::Sender<Option<Session>>,
}

impl LocalBackend {
    /// Create a backend rooted at the given directory
    pub fn new(root: PathBuf) -> Self {
        let stored = Self::read_session_file(&root.join(DAYBOOK_DIR).join("session.toml"));
        let (session, _) = watch::channel(stored);
        LocalBackend { root, session }
    }

    /// Discover journal root by walking up from current directory
    /// First checks DAYBOOK_ROOT environment variable, then falls back to discovery
    pub fn discover() -> Result<Self> {
        if let Ok(root_path) = std::env::var("DAYBOOK_ROOT") {
            let path = PathBuf::from(root_path);
            if Self::has_daybook_dir(&path) {
                return Ok(LocalBackend::new(path));
            } else {
                return Err(DaybookError::Config(format!(
                    "DAYBOOK_ROOT is set to '{}' but no .daybook directory found. \
                    Run 'daybook init' in that directory or unset DAYBOOK_ROOT.",
                    path.display()
                )));
            }
        }

        let current_dir = std::env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Discover journal root by walking up from a specific starting directory
    pub fn discover_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();

        loop {
            if Self::has_daybook_dir(&current) {
                return Ok(LocalBackend::new(current));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(DaybookError::NotDaybookDirectory(start.to_path_buf())),
            }
        }
    }

    fn has_daybook_dir(path: &Path) -> bool {
        path.join(DAYBOOK_DIR).is_dir()
    }

    fn daybook_dir(&self) -> PathBuf {
        self.root.join(DAYBOOK_DIR)
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.daybook_dir().join(collection.name())
    }

    fn document_path(&self, collection: Collection, id: &DocumentId) -> Result<PathBuf> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DaybookError::Persistence(format!(
                "Invalid document id: '{}'",
                id
            )));
        }
        Ok(self.collection_dir(collection).join(format!("{}.json", id)))
    }

    fn attachments_dir(&self) -> PathBuf {
        self.daybook_dir().join("attachments")
    }

    fn attachment_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let normal = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !normal {
            return Err(DaybookError::Persistence(format!(
                "Invalid attachment path: '{}'",
                path
            )));
        }
        Ok(self.attachments_dir().join(relative))
    }

    fn users_path(&self) -> PathBuf {
        self.daybook_dir().join("users.toml")
    }

    fn session_path(&self) -> PathBuf {
        self.daybook_dir().join("session.toml")
    }

    fn read_session_file(path: &Path) -> Option<Session> {
        let contents = fs::read_to_string(path).ok()?;
        match toml::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    async fn load_users(&self) -> Result<UserFile> {
        match tokio::fs::read_to_string(self.users_path()).await {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(UserFile::default()),
            Err(e) => Err(DaybookError::Io(e)),
        }
    }

    async fn save_users(&self, users: &UserFile) -> Result<()> {
        let contents = toml::to_string_pretty(users)?;
        write_atomic(&self.users_path(), contents.as_bytes()).await?;
        Ok(())
    }

    async fn store_session(&self, session: &Session) -> Result<()> {
        let contents = toml::to_string_pretty(session)?;
        write_atomic(&self.session_path(), contents.as_bytes()).await?;
        self.session.send_replace(Some(session.clone()));
        Ok(())
    }

    async fn read_document(&self, path: &Path) -> Result<Option<Entry>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                DaybookError::Persistence(format!("Corrupt document {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_error("read", path, e)),
        }
    }

    async fn write_document(&self, path: &Path, entry: &Entry) -> Result<()> {
        let json = serde_json::to_vec_pretty(entry)?;
        write_atomic(path, &json)
            .await
            .map_err(|e| store_error("write", path, e))
    }

    fn url_for(path: &Path) -> String {
        let encoded: Vec<String> = path
            .iter()
            .filter_map(|part| part.to_str())
            .filter(|part| *part != "/")
            .map(|part| urlencoding::encode(part).into_owned())
            .collect();
        format!("{}/{}", FILE_URL_PREFIX, encoded.join("/"))
    }

    fn path_for(url: &str) -> Result<PathBuf> {
        let rest = url
            .strip_prefix(FILE_URL_PREFIX)
            .ok_or_else(|| DaybookError::Persistence(format!("Unsupported URL: {}", url)))?;
        let mut path = PathBuf::from("/");
        for segment in rest.split('/').filter(|s| !s.is_empty()) {
            let decoded = urlencoding::decode(segment)
                .map_err(|e| DaybookError::Persistence(format!("Malformed URL {}: {}", url, e)))?;
            path.push(&*decoded);
        }
        Ok(path)
    }
}

fn store_error(action: &str, path: &Path, e: std::io::Error) -> DaybookError {
    DaybookError::Persistence(format!("Failed to {} {}: {}", action, path.display(), e))
}

/// Write using a best-effort atomic replace:
/// write to a temp file in the same directory, then rename into place.
async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp_name = format!(
        "{}.daybook-tmp-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document"),
        uuid::Uuid::new_v4().simple()
    );
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, contents).await?;

    // rename does not replace existing files on Windows
    #[cfg(windows)]
    if tokio::fs::try_exists(path).await? {
        tokio::fs::remove_file(path).await?;
    }

    tokio::fs::rename(&tmp_path, path).await
}

impl JournalRepository for LocalBackend {
    fn root(&self) -> &Path {
        &self.root
    }

    fn load_config(&self) -> Result<Config> {
        Config::load_from_dir(&self.root)
    }

    fn save_config(&self, config: &Config) -> Result<()> {
        config.save_to_dir(&self.root)
    }

    fn is_initialized(&self) -> bool {
        Self::has_daybook_dir(&self.root)
    }

    fn initialize(&self) -> Result<()> {
        let daybook_dir = self.daybook_dir();

        if daybook_dir.exists() {
            return Err(DaybookError::Config(format!(
                "Directory already initialized: {}",
                self.root.display()
            )));
        }

        fs::create_dir(&daybook_dir)?;
        for collection in [Collection::Entries, Collection::Drafts] {
            fs::create_dir(self.collection_dir(collection))?;
        }
        fs::create_dir(self.attachments_dir())?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalBackend {
    async fn insert(&self, collection: Collection, document: EntryDocument) -> Result<DocumentId> {
        let id = DocumentId::generate();
        let path = self.document_path(collection, &id)?;
        let entry = Entry::from_document(id.clone(), document, Utc::now());
        self.write_document(&path, &entry).await?;
        debug!(%collection, %id, "inserted document");
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &DocumentId,
        document: EntryDocument,
    ) -> Result<()> {
        let path = self.document_path(collection, id)?;
        if self.read_document(&path).await?.is_none() {
            return Err(DaybookError::Persistence(format!(
                "No document {} in {}",
                id, collection
            )));
        }
        let entry = Entry::from_document(id.clone(), document, Utc::now());
        self.write_document(&path, &entry).await?;
        debug!(%collection, %id, "updated document");
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &DocumentId) -> Result<()> {
        let path = self.document_path(collection, id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%collection, %id, "deleted document");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DaybookError::Persistence(format!(
                "No document {} in {}",
                id, collection
            ))),
            Err(e) => Err(store_error("delete", &path, e)),
        }
    }

    async fn get(&self, collection: Collection, id: &DocumentId) -> Result<Option<Entry>> {
        let path = self.document_path(collection, id)?;
        self.read_document(&path).await
    }

    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Entry>> {
        let dir = self.collection_dir(collection);
        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(store_error("list", &dir, e)),
        };

        let mut documents = Vec::new();
        while let Some(item) = reader
            .next_entry()
            .await
            .map_err(|e| store_error("list", &dir, e))?
        {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(entry) = self.read_document(&path).await? {
                documents.push(entry);
            }
        }

        // read_dir order is unspecified
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(query.apply(documents))
    }
}

#[async_trait]
impl AttachmentStore for LocalBackend {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let target = self.attachment_path(path)?;
        write_atomic(&target, bytes)
            .await
            .map_err(|e| store_error("upload", &target, e))?;
        debug!(path, size = bytes.len(), "stored attachment");
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String> {
        let target = self.attachment_path(path)?;
        let absolute = tokio::fs::canonicalize(&target)
            .await
            .map_err(|e| store_error("resolve", &target, e))?;
        Ok(Self::url_for(&absolute))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let path = Self::path_for(url)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| store_error("fetch", &path, e))
    }
}

#[async_trait]
impl IdentityProvider for LocalBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let users = self.load_users().await?;
        let record = users
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &record.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let session = Session::new(record.user_id.clone(), record.email.clone());
        self.store_session(&session).await?;
        info!(user_id = %session.user_id, "signed in");
        Ok(session)
    }

    async fn register(&self, email: &str, password: &str) -> Result<Session> {
        if !email.contains('@') {
            return Err(AuthError::Other(format!("Invalid email address: {}", email)).into());
        }
        validate_password_strength(password)?;

        let mut users = self.load_users().await?;
        if users.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(AuthError::EmailInUse.into());
        }

        let record = UserRecord {
            email: email.to_string(),
            user_id: uuid::Uuid::new_v4().simple().to_string(),
            password_hash: hash_password(password)?,
            created: Utc::now(),
        };
        let session = Session::new(record.user_id.clone(), record.email.clone());
        users.users.push(record);
        self.save_users(&users).await?;
        self.store_session(&session).await?;
        info!(user_id = %session.user_id, "registered account");
        Ok(session)
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        // No mail transport locally; requests are queued to a file
        let path = self.daybook_dir().join("password-resets.log");
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format!("{} {}\n", Utc::now().to_rfc3339(), email).as_bytes())
            .await?;
        info!(email, "queued password reset");
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        match tokio::fs::remove_file(self.session_path()).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(DaybookError::Io(e)),
        }
        self.session.send_replace(None);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.borrow().clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Rating, SortOption};
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_test_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvVarRestore {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvVarRestore {
        fn capture(key: &'static str) -> Self {
            Self {
                key,
                previous: std::env::var_os(key),
            }
        }
    }

    impl Drop for EnvVarRestore {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                std::env::set_var(self.key, value);
            } else {
                std::env::remove_var(self.key);
            }
        }
    }

    fn initialized() -> (TempDir, LocalBackend) {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().to_path_buf());
        backend.initialize().unwrap();
        (temp, backend)
    }

    fn document(user: &str, rating: u8) -> EntryDocument {
        EntryDocument {
            user_id: user.to_string(),
            content: "<p>hi</p>".to_string(),
            rating: Rating::new(rating).unwrap(),
            files: vec![],
            is_draft: false,
        }
    }

    #[test]
    fn test_initialize_creates_layout() {
        let (temp, backend) = initialized();
        assert!(backend.is_initialized());
        assert!(temp.path().join(".daybook/entries").is_dir());
        assert!(temp.path().join(".daybook/drafts").is_dir());
        assert!(temp.path().join(".daybook/attachments").is_dir());
    }

    #[test]
    fn test_initialize_twice_fails() {
        let (_temp, backend) = initialized();
        assert!(backend.initialize().is_err());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".daybook")).unwrap();
        let subdir = temp.path().join("sub").join("deep");
        fs::create_dir_all(&subdir).unwrap();

        let backend = LocalBackend::discover_from(&subdir).unwrap();
        assert_eq!(backend.root(), temp.path());
    }

    #[test]
    fn test_discover_fails_when_no_daybook() {
        let temp = TempDir::new().unwrap();

        match LocalBackend::discover_from(temp.path()).unwrap_err() {
            DaybookError::NotDaybookDirectory(_) => {}
            other => panic!("Expected NotDaybookDirectory error, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_uses_daybook_root_env() {
        let _lock = env_test_lock().lock().unwrap();
        let _restore = EnvVarRestore::capture("DAYBOOK_ROOT");
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".daybook")).unwrap();

        std::env::set_var("DAYBOOK_ROOT", temp.path());
        let backend = LocalBackend::discover().unwrap();
        assert_eq!(backend.root(), temp.path());
    }

    #[test]
    fn test_discover_rejects_bad_daybook_root_env() {
        let _lock = env_test_lock().lock().unwrap();
        let _restore = EnvVarRestore::capture("DAYBOOK_ROOT");
        let temp = TempDir::new().unwrap();

        std::env::set_var("DAYBOOK_ROOT", temp.path());
        assert!(matches!(
            LocalBackend::discover(),
            Err(DaybookError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let (_temp, backend) = initialized();

        let id = backend
            .insert(Collection::Drafts, document("u1", 0))
            .await
            .unwrap();
        let stored = backend.get(Collection::Drafts, &id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, "u1");

        backend
            .update(Collection::Drafts, &id, document("u1", 4))
            .await
            .unwrap();
        let updated = backend.get(Collection::Drafts, &id).await.unwrap().unwrap();
        assert_eq!(updated.rating.value(), 4);
        assert!(updated.created_at >= stored.created_at);

        backend.delete(Collection::Drafts, &id).await.unwrap();
        assert!(backend.get(Collection::Drafts, &id).await.unwrap().is_none());
        assert!(matches!(
            backend.delete(Collection::Drafts, &id).await,
            Err(DaybookError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let (_temp, backend) = initialized();
        let result = backend
            .update(Collection::Drafts, &DocumentId::new("missing"), document("u", 1))
            .await;
        assert!(matches!(result, Err(DaybookError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let (_temp, backend) = initialized();
        let result = backend
            .get(Collection::Entries, &DocumentId::new("../config"))
            .await;
        assert!(matches!(result, Err(DaybookError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_query_filters_and_sorts() {
        let (_temp, backend) = initialized();
        for (user, rating) in [("u1", 2), ("u1", 5), ("u2", 4), ("u1", 1)] {
            backend
                .insert(Collection::Entries, document(user, rating))
                .await
                .unwrap();
        }

        let results = backend
            .query(
                Collection::Entries,
                &Query::for_user("u1").order_by(SortOption::Highest.order_by()),
            )
            .await
            .unwrap();
        let ratings: Vec<u8> = results.iter().map(|e| e.rating.value()).collect();
        assert_eq!(ratings, vec![5, 2, 1]);
    }

    #[tokio::test]
    async fn test_attachment_round_trip_through_url() {
        let (_temp, backend) = initialized();
        backend
            .upload("uploads/2026_0_my notes.txt", b"payload")
            .await
            .unwrap();
        let url = backend
            .download_url("uploads/2026_0_my notes.txt")
            .await
            .unwrap();
        assert!(url.starts_with("file:///"));
        assert!(url.ends_with("2026_0_my%20notes.txt"));
        assert_eq!(backend.fetch(&url).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_upload_rejects_escaping_path() {
        let (_temp, backend) = initialized();
        assert!(backend.upload("../outside.txt", b"x").await.is_err());
        assert!(backend.upload("/etc/passwd", b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_register_sign_in_and_session_file() {
        let (temp, backend) = initialized();
        let registered = backend.register("me@example.com", "hunter22").await.unwrap();
        assert!(temp.path().join(".daybook/session.toml").exists());

        backend.sign_out().await.unwrap();
        assert!(!temp.path().join(".daybook/session.toml").exists());
        assert_eq!(backend.current_session().await.unwrap(), None);

        let session = backend.sign_in("ME@example.com", "hunter22").await.unwrap();
        assert_eq!(session.user_id, registered.user_id);

        // A fresh backend picks the stored session back up
        let reopened = LocalBackend::new(temp.path().to_path_buf());
        assert_eq!(reopened.current_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (_temp, backend) = initialized();
        backend.register("me@example.com", "hunter22").await.unwrap();
        let err = backend.register("me@example.com", "other-pass").await.unwrap_err();
        assert!(matches!(err, DaybookError::Auth(AuthError::EmailInUse)));
    }

    #[tokio::test]
    async fn test_password_reset_is_queued() {
        let (temp, backend) = initialized();
        backend.send_password_reset("me@example.com").await.unwrap();
        let log = fs::read_to_string(temp.path().join(".daybook/password-resets.log")).unwrap();
        assert!(log.contains("me@example.com"));
    }
}
