//! Broadcast channel for auth-state changes.
//!
//! Built on `tokio::sync::broadcast`. Publishing with no active subscribers
//! is a no-op. The last published identity is kept so late subscribers can
//! read the current state.

use std::sync::{Arc, RwLock};

use parley_types::event::AuthEvent;
use parley_types::identity::Identity;
use tokio::sync::broadcast;

/// Default channel capacity. Auth changes are rare.
pub const DEFAULT_CAPACITY: usize = 16;

/// Multi-consumer stream of [`AuthEvent`]s.
///
/// Cloning shares both the channel and the current identity.
#[derive(Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
    current: Arc<RwLock<Option<Identity>>>,
}

impl AuthEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Receive all future auth events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// The identity after the most recent event.
    pub fn current(&self) -> Option<Identity> {
        self.current.read().map(|c| c.clone()).unwrap_or(None)
    }

    /// Record and broadcast a change of identity.
    pub fn publish(&self, event: AuthEvent) {
        if let Ok(mut current) = self.current.write() {
            *current = event.identity().cloned();
        }
        let _ = self.sender.send(event);
    }

    pub fn signed_in(&self, identity: Identity) {
        self.publish(AuthEvent::SignedIn { identity });
    }

    pub fn signed_out(&self) {
        self.publish(AuthEvent::SignedOut);
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for AuthEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEvents")
            .field("receiver_count", &self.sender.receiver_count())
            .field("current", &self.current())
            .finish()
    }
}
