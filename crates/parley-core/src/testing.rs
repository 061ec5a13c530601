//! Shared test doubles for parley-core unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use parley_types::chat::{ChatSession, Message, Personality, Sender, SessionBody, SessionId};
use parley_types::error::{AuthError, ReplyError, StoreError};
use parley_types::event::AuthEvent;
use parley_types::identity::Identity;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;

use crate::auth::events::AuthEvents;
use crate::auth::gateway::AuthGateway;
use crate::auth::validate::{validate_email, validate_password};
use crate::exchange::responder::ResponseGenerator;
use crate::storage::history_store::HistoryStore;

/// Build a body whose messages alternate user/assistant with the given texts.
pub fn body_with(texts: &[&str]) -> SessionBody {
    let messages = texts
        .iter()
        .enumerate()
        .map(|(i, text)| Message {
            id: i as i64 + 1,
            text: text.to_string(),
            sender: if i % 2 == 0 { Sender::User } else { Sender::Assistant },
            timestamp: Utc::now(),
            contains_code: false,
            contains_task: false,
            extracted_task: None,
        })
        .collect();
    SessionBody {
        messages,
        personality: Personality::Friendly,
        updated_at: Utc::now(),
    }
}

/// Remote store that keeps documents in memory. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStore {
    docs: Arc<Mutex<Vec<(String, ChatSession)>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    async fn create(&self, user_id: &str, body: &SessionBody) -> Result<SessionId, StoreError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session_id = SessionId(format!("remote-{n}"));
        let session = ChatSession::from_body(session_id.clone(), body.clone());
        self.docs.lock().unwrap().push((user_id.to_string(), session));
        Ok(session_id)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ChatSession>, StoreError> {
        let mut sessions: Vec<ChatSession> = self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, s)| s.clone())
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn update(&self, session_id: &SessionId, body: &SessionBody) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        match docs.iter_mut().find(|(_, s)| &s.id == session_id) {
            Some((_, session)) => {
                *session = ChatSession::from_body(session_id.clone(), body.clone());
                Ok(())
            }
            None => Err(StoreError::NotFound(session_id.clone())),
        }
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.docs.lock().unwrap().retain(|(_, s)| &s.id != session_id);
        Ok(())
    }
}

/// Remote store that is always unreachable.
pub struct FailingHistoryStore;

impl HistoryStore for FailingHistoryStore {
    async fn create(&self, _user_id: &str, _body: &SessionBody) -> Result<SessionId, StoreError> {
        Err(StoreError::Unreachable("simulated outage".to_string()))
    }

    async fn list(&self, _user_id: &str) -> Result<Vec<ChatSession>, StoreError> {
        Err(StoreError::Unreachable("simulated outage".to_string()))
    }

    async fn update(&self, _session_id: &SessionId, _body: &SessionBody) -> Result<(), StoreError> {
        Err(StoreError::Unreachable("simulated outage".to_string()))
    }

    async fn delete(&self, _session_id: &SessionId) -> Result<(), StoreError> {
        Err(StoreError::Unreachable("simulated outage".to_string()))
    }
}

/// In-memory remote that can be switched offline and back. Clones share state.
#[derive(Clone, Default)]
pub struct FlakyHistoryStore {
    inner: InMemoryHistoryStore,
    offline: Arc<AtomicBool>,
}

impl FlakyHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable("simulated outage".to_string()));
        }
        Ok(())
    }
}

impl HistoryStore for FlakyHistoryStore {
    async fn create(&self, user_id: &str, body: &SessionBody) -> Result<SessionId, StoreError> {
        self.check()?;
        self.inner.create(user_id, body).await
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ChatSession>, StoreError> {
        self.check()?;
        self.inner.list(user_id).await
    }

    async fn update(&self, session_id: &SessionId, body: &SessionBody) -> Result<(), StoreError> {
        self.check()?;
        self.inner.update(session_id, body).await
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(session_id).await
    }
}

/// Generator that echoes its input and records how much context it saw.
pub struct EchoGenerator;

impl ResponseGenerator for EchoGenerator {
    async fn reply(
        &self,
        input: &str,
        _personality: Personality,
        prior: &[Message],
    ) -> Result<String, ReplyError> {
        Ok(format!("echo({}): {input}", prior.len()))
    }
}

/// Generator that always fails.
pub struct BrokenGenerator;

impl ResponseGenerator for BrokenGenerator {
    async fn reply(
        &self,
        _input: &str,
        _personality: Personality,
        _prior: &[Message],
    ) -> Result<String, ReplyError> {
        Err(ReplyError::Failed("generator offline".to_string()))
    }
}

/// Auth gateway backed by an in-memory account table.
#[derive(Default)]
pub struct FakeAuthGateway {
    users: Mutex<HashMap<String, String>>,
    events: AuthEvents,
    anonymous_disabled: bool,
}

impl FakeAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anonymous_disabled(mut self) -> Self {
        self.anonymous_disabled = true;
        self
    }

    pub fn add_user(&self, email: &str, password: &str) {
        self.users
            .lock()
            .unwrap()
            .insert(email.to_lowercase(), password.to_string());
    }
}

impl AuthGateway for FakeAuthGateway {
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        validate_email(email)?;
        validate_password(password.expose_secret())?;
        let identity = Identity::email(email);
        {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(identity.scope_key()) {
                return Err(AuthError::AlreadyExists(identity.scope_key().to_string()));
            }
            users.insert(
                identity.scope_key().to_string(),
                password.expose_secret().to_string(),
            );
        }
        self.events.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        let identity = Identity::email(email);
        let matches = self
            .users
            .lock()
            .unwrap()
            .get(identity.scope_key())
            .is_some_and(|stored| stored == password.expose_secret());
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }
        self.events.signed_in(identity.clone());
        Ok(identity)
    }

    async fn sign_in_anonymous(&self) -> Result<Identity, AuthError> {
        if self.anonymous_disabled {
            return Err(AuthError::Misconfigured("anonymous sign-in disabled".to_string()));
        }
        self.events.signed_in(Identity::Guest);
        Ok(Identity::Guest)
    }

    async fn sign_out(&self) {
        self.events.signed_out();
    }

    fn current(&self) -> Option<Identity> {
        self.events.current()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
