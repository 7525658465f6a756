//! In-memory backend implementing all three service interfaces.
//!
//! Used by the test suites and for throwaway sessions. Supports a pinned
//! clock for `createdAt` stamps, call counters, and injected failures.

use crate::domain::{Collection, DocumentId, Entry, EntryDocument, Session};
use crate::error::{AuthError, DaybookError, Result};
use crate::infrastructure::password::{hash_password, validate_password_strength, verify_password};
use crate::infrastructure::store::{AttachmentStore, DocumentStore, IdentityProvider, Query};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{watch, Mutex};

const URL_SCHEME: &str = "memory://attachments/";

/// Number of calls made against the backend, by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub uploads: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl CallCounts {
    /// Calls that wrote documents
    pub fn writes(&self) -> usize {
        self.inserts + self.updates
    }
}

#[derive(Default)]
struct Counters {
    uploads: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    upload_names: Vec<String>,
    delete_ids: HashSet<DocumentId>,
    fetch_urls: HashSet<String>,
    writes: bool,
    queries: bool,
}

struct UserRecord {
    user_id: String,
    password_hash: String,
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    // ids are zero-padded and monotonic, so map order is insertion order
    documents: HashMap<Collection, BTreeMap<DocumentId, Entry>>,
    blobs: HashMap<String, Vec<u8>>,
    users: HashMap<String, UserRecord>,
    reset_requests: Vec<String>,
    clock: Option<DateTime<Utc>>,
}

impl MemoryState {
    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut BTreeMap<DocumentId, Entry> {
        self.documents.entry(collection).or_default()
    }
}

pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    faults: Mutex<Faults>,
    counters: Counters,
    session: watch::Sender<Option<Session>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        MemoryBackend {
            state: Mutex::new(MemoryState::default()),
            faults: Mutex::new(Faults::default()),
            counters: Counters::default(),
            session,
        }
    }

    /// Pin the timestamp stamped on writes; `None` returns to the system clock
    pub async fn set_clock(&self, now: Option<DateTime<Utc>>) {
        self.state.lock().await.clock = now;
    }

    /// Make uploads whose path ends with `name` fail
    pub async fn fail_uploads_named(&self, name: &str) {
        self.faults.lock().await.upload_names.push(name.to_string());
    }

    /// Make deletes of `id` fail
    pub async fn fail_delete_of(&self, id: &DocumentId) {
        self.faults.lock().await.delete_ids.insert(id.clone());
    }

    /// Make fetches of `url` fail
    pub async fn fail_fetch_of(&self, url: &str) {
        self.faults.lock().await.fetch_urls.insert(url.to_string());
    }

    /// Make every insert and update fail
    pub async fn fail_writes(&self, fail: bool) {
        self.faults.lock().await.writes = fail;
    }

    /// Make every query fail
    pub async fn fail_queries(&self, fail: bool) {
        self.faults.lock().await.queries = fail;
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            uploads: self.counters.uploads.load(Ordering::SeqCst),
            inserts: self.counters.inserts.load(Ordering::SeqCst),
            updates: self.counters.updates.load(Ordering::SeqCst),
            deletes: self.counters.deletes.load(Ordering::SeqCst),
        }
    }

    pub async fn document_count(&self, collection: Collection) -> usize {
        self.state
            .lock()
            .await
            .documents
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    pub async fn blob_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.lock().await.blobs.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Emails that requested a password reset, in order
    pub async fn reset_requests(&self) -> Vec<String> {
        self.state.lock().await.reset_requests.clone()
    }

    /// Store a fully formed document, bypassing the counters and clock
    pub async fn seed(&self, collection: Collection, entry: Entry) {
        let mut state = self.state.lock().await;
        state.collection_mut(collection).insert(entry.id.clone(), entry);
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn insert(&self, collection: Collection, document: EntryDocument) -> Result<DocumentId> {
        self.counters.inserts.fetch_add(1, Ordering::SeqCst);
        if self.faults.lock().await.writes {
            return Err(DaybookError::Persistence(format!(
                "insert into {} rejected",
                collection
            )));
        }

        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = DocumentId::new(format!("doc-{:06}", state.next_id));
        let created_at = state.now();
        let entry = Entry::from_document(id.clone(), document, created_at);
        state.collection_mut(collection).insert(id.clone(), entry);
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &DocumentId,
        document: EntryDocument,
    ) -> Result<()> {
        self.counters.updates.fetch_add(1, Ordering::SeqCst);
        if self.faults.lock().await.writes {
            return Err(DaybookError::Persistence(format!(
                "update of {}/{} rejected",
                collection, id
            )));
        }

        let mut state = self.state.lock().await;
        let created_at = state.now();
        let documents = state.collection_mut(collection);
        match documents.get_mut(id) {
            Some(existing) => {
                *existing = Entry::from_document(id.clone(), document, created_at);
                Ok(())
            }
            None => Err(DaybookError::Persistence(format!(
                "No document {} in {}",
                id, collection
            ))),
        }
    }

    async fn delete(&self, collection: Collection, id: &DocumentId) -> Result<()> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        if self.faults.lock().await.delete_ids.contains(id) {
            return Err(DaybookError::Persistence(format!(
                "delete of {}/{} rejected",
                collection, id
            )));
        }

        let mut state = self.state.lock().await;
        match state.collection_mut(collection).remove(id) {
            Some(_) => Ok(()),
            None => Err(DaybookError::Persistence(format!(
                "No document {} in {}",
                id, collection
            ))),
        }
    }

    async fn get(&self, collection: Collection, id: &DocumentId) -> Result<Option<Entry>> {
        let state = self.state.lock().await;
        Ok(state
            .documents
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Entry>> {
        if self.faults.lock().await.queries {
            return Err(DaybookError::Persistence(format!(
                "query on {} rejected",
                collection
            )));
        }

        let state = self.state.lock().await;
        let documents = state
            .documents
            .get(&collection)
            .map(|docs| docs.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(query.apply(documents))
    }
}

#[async_trait]
impl AttachmentStore for MemoryBackend {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.counters.uploads.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .faults
            .lock()
            .await
            .upload_names
            .iter()
            .any(|name| path.ends_with(name.as_str()));
        if failing {
            return Err(DaybookError::Persistence(format!("upload of {} rejected", path)));
        }

        self.state
            .lock()
            .await
            .blobs
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String> {
        let state = self.state.lock().await;
        if !state.blobs.contains_key(path) {
            return Err(DaybookError::Persistence(format!("No attachment at {}", path)));
        }
        Ok(format!("{}{}", URL_SCHEME, urlencoding::encode(path)))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if self.faults.lock().await.fetch_urls.contains(url) {
            return Err(DaybookError::Persistence(format!("fetch of {} rejected", url)));
        }

        let encoded = url
            .strip_prefix(URL_SCHEME)
            .ok_or_else(|| DaybookError::Persistence(format!("Unsupported URL: {}", url)))?;
        let path = urlencoding::decode(encoded)
            .map_err(|e| DaybookError::Persistence(format!("Malformed URL {}: {}", url, e)))?;

        self.state
            .lock()
            .await
            .blobs
            .get(&*path)
            .cloned()
            .ok_or_else(|| DaybookError::Persistence(format!("No attachment at {}", path)))
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let user_id = {
            let state = self.state.lock().await;
            let record = state
                .users
                .get(&email.to_lowercase())
                .ok_or(AuthError::InvalidCredentials)?;
            if !verify_password(password, &record.password_hash)? {
                return Err(AuthError::InvalidCredentials.into());
            }
            record.user_id.clone()
        };

        let session = Session::new(user_id, email);
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn register(&self, email: &str, password: &str) -> Result<Session> {
        if !email.contains('@') {
            return Err(AuthError::Other(format!("Invalid email address: {}", email)).into());
        }
        validate_password_strength(password)?;

        let key = email.to_lowercase();
        let user_id = {
            let mut state = self.state.lock().await;
            if state.users.contains_key(&key) {
                return Err(AuthError::EmailInUse.into());
            }
            let user_id = uuid::Uuid::new_v4().simple().to_string();
            state.users.insert(
                key,
                UserRecord {
                    user_id: user_id.clone(),
                    password_hash: hash_password(password)?,
                },
            );
            user_id
        };

        let session = Session::new(user_id, email);
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        self.state
            .lock()
            .await
            .reset_requests
            .push(email.to_lowercase());
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
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
