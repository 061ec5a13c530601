//! Session lifecycle for one identity.
//!
//! Owns the active message list and the history index, and writes every
//! change through to the selected [`SessionStore`]. Store failures are
//! logged, never returned: local state stays the source of truth for the
//! running session.

use chrono::{DateTime, Utc};
use parley_types::chat::{ChatSession, Message, Personality, SessionBody, SessionId};
use parley_types::error::SessionError;
use parley_types::identity::Identity;
use tracing::{debug, info, warn};

use super::clock::MessageClock;
use crate::storage::session_store::SessionStore;

/// Manages the active chat session and the history index for one identity.
///
/// At most one session is active. Its id is unset until the first message
/// is appended, at which point the store assigns one.
pub struct SessionLifecycle<S> {
    store: S,
    identity: Identity,
    messages: Vec<Message>,
    active_id: Option<SessionId>,
    personality: Personality,
    history: Vec<ChatSession>,
    /// Bumped whenever the active session is switched or detached.
    epoch: u64,
    clock: MessageClock,
}

impl<S: SessionStore> SessionLifecycle<S> {
    /// Open the lifecycle for `identity` and load its prior sessions.
    ///
    /// An unreadable history is logged and treated as empty.
    pub async fn open(identity: Identity, store: S, personality: Personality) -> Self {
        let history = match store.list().await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(identity = %identity, error = %e, "Failed to load chat history, starting empty");
                Vec::new()
            }
        };
        info!(
            identity = %identity,
            backend = store.backend_name(),
            sessions = history.len(),
            "Chat history loaded"
        );

        let mut clock = MessageClock::new();
        for message in history.iter().flat_map(|s| s.messages.iter()) {
            clock.observe(message.id);
        }

        Self {
            store,
            identity,
            messages: Vec::new(),
            active_id: None,
            personality,
            history,
            epoch: 0,
            clock,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Messages of the active session, in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn active_id(&self) -> Option<&SessionId> {
        self.active_id.as_ref()
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// The history index, one entry per session id.
    pub fn history(&self) -> &[ChatSession] {
        &self.history
    }

    /// Look up a session in the history index.
    pub fn find(&self, session_id: &SessionId) -> Option<&ChatSession> {
        self.history.iter().find(|s| &s.id == session_id)
    }

    /// Changes whenever the active session is switched.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Next message id and timestamp. Ids strictly increase.
    pub fn stamp(&mut self) -> (i64, DateTime<Utc>) {
        self.clock.next()
    }

    /// Refresh the history index from the store.
    ///
    /// The active session is kept in the index even if the store does not
    /// know it (e.g. it was created while the remote was unreachable).
    pub async fn reload_history(&mut self) {
        let mut sessions = match self.store.list().await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(identity = %self.identity, error = %e, "Failed to refresh chat history");
                return;
            }
        };
        if let Some(active_id) = &self.active_id {
            if !sessions.iter().any(|s| &s.id == active_id) {
                if let Some(active) = self.find(active_id) {
                    sessions.insert(0, active.clone());
                }
            }
        }
        self.history = sessions;
    }

    /// Detach the active session and begin an empty one.
    ///
    /// Nothing is written until the next message is appended.
    pub fn start_new_session(&mut self) {
        self.messages.clear();
        self.active_id = None;
        self.epoch += 1;
        debug!(identity = %self.identity, "Started new chat session");
    }

    /// Make a session from the history index active.
    pub fn load_session(&mut self, session_id: &SessionId) -> Result<(), SessionError> {
        let session = self
            .find(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;

        for message in &session.messages {
            self.clock.observe(message.id);
        }
        self.messages = session.messages;
        self.personality = session.personality;
        self.active_id = Some(session.id);
        self.epoch += 1;
        debug!(session_id = %session_id, messages = self.messages.len(), "Loaded chat session");
        Ok(())
    }

    /// Append a message to the active session and persist it.
    ///
    /// The first append creates the durable record; later appends update it.
    /// Returns the active session id.
    pub async fn append_message(&mut self, message: Message) -> SessionId {
        self.clock.observe(message.id);
        self.messages.push(message);
        self.persist_active().await
    }

    /// Change the personality for the active session.
    ///
    /// Persisted immediately when the session already has a record.
    pub async fn set_personality(&mut self, personality: Personality) {
        self.personality = personality;
        if self.active_id.is_some() {
            self.persist_active().await;
        }
    }

    /// Delete a session from the store and the index.
    ///
    /// Deleting the active session detaches it. Unknown ids are a no-op.
    /// Returns whether the id was in the index.
    pub async fn delete_session(&mut self, session_id: &SessionId) -> bool {
        let known = self.find(session_id).is_some();
        if known {
            if let Err(e) = self.store.delete(session_id).await {
                warn!(session_id = %session_id, error = %e, "Failed to delete chat session from store");
            }
            self.history.retain(|s| &s.id != session_id);
            info!(session_id = %session_id, "Deleted chat session");
        } else {
            debug!(session_id = %session_id, "Delete of unknown session ignored");
        }

        if self.active_id.as_ref() == Some(session_id) {
            self.start_new_session();
        }
        known
    }

    async fn persist_active(&mut self) -> SessionId {
        let body = SessionBody {
            messages: self.messages.clone(),
            personality: self.personality,
            updated_at: Utc::now(),
        };

        let session_id = match &self.active_id {
            Some(session_id) => {
                if let Err(e) = self.store.update(session_id, &body).await {
                    warn!(session_id = %session_id, error = %e, "Failed to save chat session");
                }
                session_id.clone()
            }
            None => match self.store.create(&body).await {
                Ok(session_id) => {
                    debug!(session_id = %session_id, "Created chat session");
                    session_id
                }
                Err(e) => {
                    let session_id = SessionId::generate();
                    warn!(session_id = %session_id, error = %e, "Failed to create chat session, keeping it in memory");
                    session_id
                }
            },
        };

        self.active_id = Some(session_id.clone());
        // Most recently updated first
        self.history.retain(|s| s.id != session_id);
        self.history.insert(0, ChatSession::from_body(session_id.clone(), body));
        session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::chat::Sender;

    use crate::storage::blob_store::{BlobStore, MemoryBlobStore};
    use crate::storage::history_store::HistoryStore;
    use crate::storage::session_store::{LocalSessionStore, NoRemote, StorageBackend};
    use crate::testing::{FailingHistoryStore, FlakyHistoryStore, InMemoryHistoryStore};

    type GuestLifecycle = SessionLifecycle<StorageBackend<NoRemote, MemoryBlobStore>>;

    async fn guest(blobs: &MemoryBlobStore) -> GuestLifecycle {
        let store = StorageBackend::select(&Identity::Guest, None, blobs.clone());
        SessionLifecycle::open(Identity::Guest, store, Personality::Friendly).await
    }

    fn message<S: SessionStore>(lifecycle: &mut SessionLifecycle<S>, text: &str) -> Message {
        let (id, timestamp) = lifecycle.stamp();
        Message {
            id,
            text: text.to_string(),
            sender: Sender::User,
            timestamp,
            contains_code: false,
            contains_task: false,
            extracted_task: None,
        }
    }

    async fn say<S: SessionStore>(lifecycle: &mut SessionLifecycle<S>, text: &str) -> SessionId {
        let msg = message(lifecycle, text);
        lifecycle.append_message(msg).await
    }

    #[tokio::test]
    async fn test_appends_keep_call_order() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;

        for i in 0..5 {
            say(&mut lifecycle, &format!("message {i}")).await;
        }

        let texts: Vec<&str> = lifecycle.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["message 0", "message 1", "message 2", "message 3", "message 4"]);
        let ids: Vec<i64> = lifecycle.messages().iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_first_append_creates_later_appends_update() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;
        assert!(lifecycle.active_id().is_none());

        let first = say(&mut lifecycle, "Hello").await;
        let second = say(&mut lifecycle, "Again").await;
        assert_eq!(first, second);

        let stored = lifecycle.store().list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].messages.len(), 2);
        assert_eq!(lifecycle.history().len(), 1);
    }

    #[tokio::test]
    async fn test_guest_hello_lands_in_index() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;

        say(&mut lifecycle, "Hello").await;

        assert_eq!(lifecycle.history().len(), 1);
        assert_eq!(lifecycle.history()[0].messages[0].text, "Hello");
        assert_eq!(lifecycle.history()[0].title(), "Hello");
        assert!(blobs.get("chatbot_history_guest").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_new_session_gets_distinct_id_and_old_stays_loadable() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;

        let first = say(&mut lifecycle, "first chat").await;
        lifecycle.start_new_session();
        assert!(lifecycle.messages().is_empty());
        assert!(lifecycle.active_id().is_none());

        let second = say(&mut lifecycle, "second chat").await;
        assert_ne!(first, second);
        assert_eq!(lifecycle.history().len(), 2);
        // Newest first
        assert_eq!(lifecycle.history()[0].id, second);

        lifecycle.load_session(&first).unwrap();
        assert_eq!(lifecycle.active_id(), Some(&first));
        assert_eq!(lifecycle.messages()[0].text, "first chat");
    }

    #[tokio::test]
    async fn test_new_session_discards_no_persisted_data() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;

        say(&mut lifecycle, "one").await;
        say(&mut lifecycle, "two").await;
        lifecycle.start_new_session();

        let stored = lifecycle.store().list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].messages.len(), 2);
        assert_eq!(lifecycle.history().len(), 1);
    }

    #[tokio::test]
    async fn test_load_session_is_idempotent() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;
        let id = say(&mut lifecycle, "Hello").await;
        lifecycle.start_new_session();

        lifecycle.load_session(&id).unwrap();
        let once = lifecycle.messages().to_vec();
        lifecycle.load_session(&id).unwrap();

        assert_eq!(lifecycle.messages(), once.as_slice());
        assert_eq!(lifecycle.active_id(), Some(&id));
        assert_eq!(lifecycle.history().len(), 1);
    }

    #[tokio::test]
    async fn test_load_unknown_session_is_not_found() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;

        let err = lifecycle.load_session(&SessionId::from("missing")).unwrap_err();
        assert_eq!(err, SessionError::NotFound(SessionId::from("missing")));
    }

    #[tokio::test]
    async fn test_delete_then_load_is_not_found() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;
        let id = say(&mut lifecycle, "Hello").await;
        lifecycle.start_new_session();

        assert!(lifecycle.delete_session(&id).await);

        assert!(matches!(lifecycle.load_session(&id), Err(SessionError::NotFound(_))));
        assert!(lifecycle.store().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_session_is_noop() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;
        let id = say(&mut lifecycle, "Hello").await;

        assert!(!lifecycle.delete_session(&SessionId::from("missing")).await);
        assert_eq!(lifecycle.history().len(), 1);
        assert_eq!(lifecycle.active_id(), Some(&id));
    }

    #[tokio::test]
    async fn test_delete_active_session_resets() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;
        let id = say(&mut lifecycle, "Hello").await;
        let epoch = lifecycle.epoch();

        lifecycle.delete_session(&id).await;

        assert!(lifecycle.active_id().is_none());
        assert!(lifecycle.messages().is_empty());
        assert!(lifecycle.epoch() > epoch);
    }

    #[tokio::test]
    async fn test_history_survives_reopen() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;
        let id = say(&mut lifecycle, "persist me").await;
        let last_id = lifecycle.messages()[0].id;
        drop(lifecycle);

        let mut reopened = guest(&blobs).await;
        assert_eq!(reopened.history().len(), 1);
        reopened.load_session(&id).unwrap();
        assert_eq!(reopened.messages()[0].text, "persist me");

        let (next_id, _) = reopened.stamp();
        assert!(next_id > last_id);
    }

    #[tokio::test]
    async fn test_set_personality_persists_active_session() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;

        // No record yet, nothing written
        lifecycle.set_personality(Personality::Technical).await;
        assert!(lifecycle.store().list().await.unwrap().is_empty());

        say(&mut lifecycle, "Hello").await;
        lifecycle.set_personality(Personality::Creative).await;

        let stored = lifecycle.store().list().await.unwrap();
        assert_eq!(stored[0].personality, Personality::Creative);
    }

    #[tokio::test]
    async fn test_failing_remote_never_blocks() {
        let identity = Identity::email("ada@example.com");
        let blobs = MemoryBlobStore::new();
        let store = StorageBackend::select(&identity, Some(FailingHistoryStore), blobs.clone());
        let mut lifecycle = SessionLifecycle::open(identity.clone(), store, Personality::Friendly).await;

        let first = say(&mut lifecycle, "Hello").await;
        say(&mut lifecycle, "still here").await;
        lifecycle.set_personality(Personality::Professional).await;
        lifecycle.start_new_session();
        let second = say(&mut lifecycle, "another").await;
        lifecycle.load_session(&first).unwrap();
        lifecycle.delete_session(&second).await;
        lifecycle.reload_history().await;

        assert_eq!(lifecycle.history().len(), 1);
        assert_eq!(lifecycle.history()[0].messages.len(), 2);

        let mirror = LocalSessionStore::new(blobs, &identity);
        let local = mirror.snapshot().unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].id, first);
        assert_eq!(local[0].personality, Personality::Professional);
    }

    #[tokio::test]
    async fn test_session_written_during_outage_survives_recovery() {
        let identity = Identity::email("ada@example.com");
        let remote = FlakyHistoryStore::new();
        let blobs = MemoryBlobStore::new();
        remote.set_offline(true);

        let store = StorageBackend::select(&identity, Some(remote.clone()), blobs.clone());
        let mut lifecycle = SessionLifecycle::open(identity.clone(), store, Personality::Friendly).await;
        let offline_id = say(&mut lifecycle, "written during outage").await;
        lifecycle.start_new_session();

        remote.set_offline(false);
        lifecycle.reload_history().await;
        assert!(lifecycle.find(&offline_id).is_some());
        lifecycle.load_session(&offline_id).unwrap();
        assert_eq!(lifecycle.messages()[0].text, "written during outage");

        let online_id = say(&mut lifecycle, "after recovery").await;
        assert_eq!(online_id, offline_id);
        drop(lifecycle);

        let store = StorageBackend::select(&identity, Some(remote.clone()), blobs.clone());
        let reopened = SessionLifecycle::open(identity.clone(), store, Personality::Friendly).await;
        let session = reopened.find(&offline_id).unwrap();
        assert_eq!(session.messages.len(), 2);

        let mirror = LocalSessionStore::new(blobs, &identity);
        assert!(mirror.snapshot().unwrap().iter().any(|s| s.id == offline_id));
    }

    #[tokio::test]
    async fn test_updated_session_moves_to_front_of_history() {
        let blobs = MemoryBlobStore::new();
        let mut lifecycle = guest(&blobs).await;

        let first = say(&mut lifecycle, "first chat").await;
        lifecycle.start_new_session();
        let second = say(&mut lifecycle, "second chat").await;
        assert_eq!(lifecycle.history()[0].id, second);

        lifecycle.load_session(&first).unwrap();
        say(&mut lifecycle, "back to the first").await;

        let ids: Vec<&SessionId> = lifecycle.history().iter().map(|s| &s.id).collect();
        assert_eq!(ids, [&first, &second]);
    }

    #[tokio::test]
    async fn test_remote_backend_assigns_ids() {
        let identity = Identity::email("ada@example.com");
        let remote = InMemoryHistoryStore::new();
        let store = StorageBackend::select(&identity, Some(remote.clone()), MemoryBlobStore::new());
        let mut lifecycle = SessionLifecycle::open(identity, store, Personality::Friendly).await;

        let id = say(&mut lifecycle, "Hello").await;
        assert!(id.as_str().starts_with("remote-"));

        let remote_sessions = remote.list("ada@example.com").await.unwrap();
        assert_eq!(remote_sessions.len(), 1);
        assert_eq!(remote_sessions[0].id, id);
    }
}
