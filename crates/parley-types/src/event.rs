//! Auth-state change notifications.
//!
//! The auth gateway publishes one [`AuthEvent`] on every change of the
//! current identity. The top-level controller subscribes once at startup.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// A change of the current identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    /// A principal signed in (or continued as guest).
    SignedIn { identity: Identity },
    /// The current principal signed out; there is no identity now.
    SignedOut,
}

impl AuthEvent {
    /// The identity current after this event, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthEvent::SignedIn { identity } => Some(identity),
            AuthEvent::SignedOut => None,
        }
    }
}
