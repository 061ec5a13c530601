//! Identity of the principal a chat history is scoped to.
//!
//! An identity is either an authenticated email address or the anonymous
//! guest sentinel. It decides which storage backend holds the history.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Scope key used for the guest sentinel, both in storage keys and on the wire.
pub const GUEST_SCOPE: &str = "guest";

/// The authenticated (or guest) principal under which sessions are scoped.
///
/// Serialized as a plain string: the email address, or `"guest"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Identity {
    /// A signed-in user, identified by email address.
    Email(String),
    /// Anonymous use. History lives only in on-device storage.
    Guest,
}

impl Identity {
    /// Build an email identity, normalizing surrounding whitespace and case.
    pub fn email(address: impl AsRef<str>) -> Self {
        Identity::Email(address.as_ref().trim().to_lowercase())
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }

    /// Key that scopes this identity's data in every backend.
    pub fn scope_key(&self) -> &str {
        match self {
            Identity::Email(address) => address,
            Identity::Guest => GUEST_SCOPE,
        }
    }

    /// Human-readable label for display ("Guest" or the email address).
    pub fn display_name(&self) -> &str {
        match self {
            Identity::Email(address) => address,
            Identity::Guest => "Guest",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scope_key())
    }
}

impl FromStr for Identity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("identity must not be empty".to_string());
        }
        if trimmed.eq_ignore_ascii_case(GUEST_SCOPE) {
            Ok(Identity::Guest)
        } else {
            Ok(Identity::email(trimmed))
        }
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.scope_key().to_string()
    }
}

impl TryFrom<String> for Identity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
