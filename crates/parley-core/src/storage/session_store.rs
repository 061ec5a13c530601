//! The storage capability the session lifecycle writes through.
//!
//! `SessionStore` has two implementations, selected once per identity by
//! [`StorageBackend::select`]:
//!
//! - [`LocalSessionStore`]: the whole history index serialized as one blob
//!   in a [`BlobStore`], keyed per identity. Used for guests and whenever
//!   the remote store is unavailable.
//! - [`ReplicatedSessionStore`]: writes go to the remote [`HistoryStore`]
//!   and are mirrored into the local blob. Remote failures are logged and
//!   the local mirror answers instead.

use parley_types::chat::{ChatSession, SessionBody, SessionId};
use parley_types::error::StoreError;
use parley_types::identity::Identity;
use tracing::{debug, info, warn};

use super::blob_store::BlobStore;
use super::history_store::HistoryStore;

/// Prefix of the blob key holding an identity's history index.
pub const HISTORY_KEY_PREFIX: &str = "chatbot_history_";

/// Suffix of the key an unreadable history blob is moved to.
pub const CORRUPT_SUFFIX: &str = ".corrupt";

/// Blob key for an identity's history index (e.g. `chatbot_history_guest`).
pub fn history_key(identity: &Identity) -> String {
    format!("{HISTORY_KEY_PREFIX}{}", identity.scope_key())
}

/// Persistence capability for one identity's chat sessions.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait SessionStore: Send + Sync {
    /// Short backend name for logs ("local", "replicated").
    fn backend_name(&self) -> &'static str;

    /// All sessions for the identity, most recently updated first.
    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, StoreError>> + Send;

    /// Persist a new session and return its assigned id.
    fn create(
        &self,
        body: &SessionBody,
    ) -> impl std::future::Future<Output = Result<SessionId, StoreError>> + Send;

    /// Replace the stored body of an existing session.
    fn update(
        &self,
        session_id: &SessionId,
        body: &SessionBody,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove a session. No-op if it does not exist.
    fn delete(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// Local blob-backed store
// ---------------------------------------------------------------------------

/// History index for one identity, stored as a single JSON blob.
pub struct LocalSessionStore<B> {
    blobs: B,
    key: String,
}

impl<B: BlobStore> LocalSessionStore<B> {
    /// Create a store scoped to `identity` inside `blobs`.
    pub fn new(blobs: B, identity: &Identity) -> Self {
        Self {
            blobs,
            key: history_key(identity),
        }
    }

    /// The blob key this store reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the index. An unreadable blob is moved aside to
    /// `{key}.corrupt` and an empty index is returned, so writes recover.
    fn read_index(&self) -> Result<Vec<ChatSession>, StoreError> {
        let Some(json) = self.blobs.get(&self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&json) {
            Ok(sessions) => Ok(sessions),
            Err(e) => {
                let aside = format!("{}{CORRUPT_SUFFIX}", self.key);
                warn!(key = %self.key, moved_to = %aside, error = %e, "Unreadable history blob, starting a fresh index");
                self.blobs.set(&aside, &json)?;
                self.blobs.remove(&self.key)?;
                Ok(Vec::new())
            }
        }
    }

    fn write_index(&self, sessions: &[ChatSession]) -> Result<(), StoreError> {
        let json = serde_json::to_string(sessions)
            .map_err(|e| StoreError::Serialization(format!("failed to serialize history: {e}")))?;
        self.blobs.set(&self.key, &json)
    }

    /// Insert the session (at the front) or replace the entry with the same id.
    pub fn upsert(&self, session_id: &SessionId, body: &SessionBody) -> Result<(), StoreError> {
        let mut sessions = self.read_index()?;
        let session = ChatSession::from_body(session_id.clone(), body.clone());
        match sessions.iter().position(|s| &s.id == session_id) {
            Some(index) => sessions[index] = session,
            None => sessions.insert(0, session),
        }
        self.write_index(&sessions)
    }

    /// Remove the entry with this id, if any.
    pub fn remove(&self, session_id: &SessionId) -> Result<(), StoreError> {
        let mut sessions = self.read_index()?;
        let before = sessions.len();
        sessions.retain(|s| &s.id != session_id);
        if sessions.len() == before {
            return Ok(());
        }
        self.write_index(&sessions)
    }

    /// Fold a remote listing into the index and return the merged set,
    /// most recently updated first.
    ///
    /// Entries only the index knows (written while the remote was down)
    /// are kept. For ids both sides know, the newer `updated_at` wins.
    pub fn merge_remote(&self, remote: Vec<ChatSession>) -> Result<Vec<ChatSession>, StoreError> {
        let local = self.read_index()?;
        let mut merged = remote;
        for session in local {
            match merged.iter_mut().find(|s| s.id == session.id) {
                Some(existing) if existing.updated_at < session.updated_at => *existing = session,
                Some(_) => {}
                None => merged.push(session),
            }
        }
        merged.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.write_index(&merged)?;
        Ok(merged)
    }

    /// The stored index, most recently updated first.
    pub fn snapshot(&self) -> Result<Vec<ChatSession>, StoreError> {
        let mut sessions = self.read_index()?;
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// Persist a new session under a locally generated id.
    pub fn create_local(&self, body: &SessionBody) -> Result<SessionId, StoreError> {
        let session_id = SessionId::generate();
        self.upsert(&session_id, body)?;
        Ok(session_id)
    }
}

impl<B: BlobStore> SessionStore for LocalSessionStore<B> {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn list(&self) -> Result<Vec<ChatSession>, StoreError> {
        self.snapshot()
    }

    async fn create(&self, body: &SessionBody) -> Result<SessionId, StoreError> {
        self.create_local(body)
    }

    async fn update(&self, session_id: &SessionId, body: &SessionBody) -> Result<(), StoreError> {
        self.upsert(session_id, body)
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.remove(session_id)
    }
}

// ---------------------------------------------------------------------------
// Remote store with a local mirror
// ---------------------------------------------------------------------------

/// Remote document store with best-effort replication and a local mirror.
///
/// The local mirror is always written; the remote is written first and its
/// failures are logged, never returned.
pub struct ReplicatedSessionStore<R, B> {
    remote: R,
    local: LocalSessionStore<B>,
    user_id: String,
}

impl<R: HistoryStore, B: BlobStore> ReplicatedSessionStore<R, B> {
    /// Create a replicated store for a signed-in identity.
    pub fn new(remote: R, blobs: B, identity: &Identity) -> Self {
        Self {
            remote,
            local: LocalSessionStore::new(blobs, identity),
            user_id: identity.scope_key().to_string(),
        }
    }

    /// Access the local mirror.
    pub fn local(&self) -> &LocalSessionStore<B> {
        &self.local
    }

    /// Access the remote store.
    pub fn remote(&self) -> &R {
        &self.remote
    }
}

impl<R: HistoryStore, B: BlobStore> SessionStore for ReplicatedSessionStore<R, B> {
    fn backend_name(&self) -> &'static str {
        "replicated"
    }

    async fn list(&self) -> Result<Vec<ChatSession>, StoreError> {
        match self.remote.list(&self.user_id).await {
            Ok(sessions) => match self.local.merge_remote(sessions.clone()) {
                Ok(merged) => Ok(merged),
                Err(e) => {
                    warn!(error = %e, "Failed to refresh local history mirror");
                    Ok(sessions)
                }
            },
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Remote history unavailable, using local mirror");
                self.local.snapshot()
            }
        }
    }

    async fn create(&self, body: &SessionBody) -> Result<SessionId, StoreError> {
        match self.remote.create(&self.user_id, body).await {
            Ok(session_id) => {
                if let Err(e) = self.local.upsert(&session_id, body) {
                    warn!(session_id = %session_id, error = %e, "Failed to mirror new session locally");
                }
                Ok(session_id)
            }
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Remote create failed, keeping session local");
                self.local.create_local(body)
            }
        }
    }

    async fn update(&self, session_id: &SessionId, body: &SessionBody) -> Result<(), StoreError> {
        if let Err(e) = self.remote.update(session_id, body).await {
            warn!(session_id = %session_id, error = %e, "Remote update failed");
        }
        self.local.upsert(session_id, body)
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        if let Err(e) = self.remote.delete(session_id).await {
            warn!(session_id = %session_id, error = %e, "Remote delete failed");
        }
        self.local.remove(session_id)
    }
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// Placeholder remote type for setups that never have a remote store.
///
/// Uninhabited: a `StorageBackend<NoRemote, _>` is always local.
pub enum NoRemote {}

impl HistoryStore for NoRemote {
    async fn create(&self, _user_id: &str, _body: &SessionBody) -> Result<SessionId, StoreError> {
        match *self {}
    }

    async fn list(&self, _user_id: &str) -> Result<Vec<ChatSession>, StoreError> {
        match *self {}
    }

    async fn update(&self, _session_id: &SessionId, _body: &SessionBody) -> Result<(), StoreError> {
        match *self {}
    }

    async fn delete(&self, _session_id: &SessionId) -> Result<(), StoreError> {
        match *self {}
    }
}

/// The storage backend chosen for one identity.
pub enum StorageBackend<R, B> {
    Local(LocalSessionStore<B>),
    Replicated(ReplicatedSessionStore<R, B>),
}

impl<R: HistoryStore, B: BlobStore> StorageBackend<R, B> {
    /// Pick the backend for `identity`.
    ///
    /// Guests always use local storage. Signed-in identities use the remote
    /// store when one is reachable (`remote` is `Some`), local otherwise.
    pub fn select(identity: &Identity, remote: Option<R>, blobs: B) -> Self {
        match (identity, remote) {
            (Identity::Guest, _) => {
                debug!("Guest identity, using local history");
                StorageBackend::Local(LocalSessionStore::new(blobs, identity))
            }
            (Identity::Email(_), Some(remote)) => {
                debug!(user = %identity, "Using remote history with local mirror");
                StorageBackend::Replicated(ReplicatedSessionStore::new(remote, blobs, identity))
            }
            (Identity::Email(_), None) => {
                info!(user = %identity, "Remote history unreachable, falling back to local");
                StorageBackend::Local(LocalSessionStore::new(blobs, identity))
            }
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, StorageBackend::Local(_))
    }
}

impl<R: HistoryStore, B: BlobStore> SessionStore for StorageBackend<R, B> {
    fn backend_name(&self) -> &'static str {
        match self {
            StorageBackend::Local(store) => store.backend_name(),
            StorageBackend::Replicated(store) => store.backend_name(),
        }
    }

    async fn list(&self) -> Result<Vec<ChatSession>, StoreError> {
        match self {
            StorageBackend::Local(store) => store.list().await,
            StorageBackend::Replicated(store) => store.list().await,
        }
    }

    async fn create(&self, body: &SessionBody) -> Result<SessionId, StoreError> {
        match self {
            StorageBackend::Local(store) => store.create(body).await,
            StorageBackend::Replicated(store) => store.create(body).await,
        }
    }

    async fn update(&self, session_id: &SessionId, body: &SessionBody) -> Result<(), StoreError> {
        match self {
            StorageBackend::Local(store) => store.update(session_id, body).await,
            StorageBackend::Replicated(store) => store.update(session_id, body).await,
        }
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        match self {
            StorageBackend::Local(store) => store.delete(session_id).await,
            StorageBackend::Replicated(store) => store.delete(session_id).await,
        }
    }
}
