//! Chat session and message types for Parley.
//!
//! These types model a conversation between a user and the assistant:
//! immutable messages, the session that orders them, and the document body
//! written to the history stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Title shown for a session that has no messages yet.
pub const UNTITLED_SESSION: &str = "New Chat";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    /// Older histories recorded assistant replies as `"ai"`.
    #[serde(alias = "ai")]
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

/// Tone the response generator answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    #[default]
    Friendly,
    Professional,
    Technical,
    Creative,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Friendly,
        Personality::Professional,
        Personality::Technical,
        Personality::Creative,
    ];
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Personality::Friendly => write!(f, "friendly"),
            Personality::Professional => write!(f, "professional"),
            Personality::Technical => write!(f, "technical"),
            Personality::Creative => write!(f, "creative"),
        }
    }
}

impl FromStr for Personality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "friendly" => Ok(Personality::Friendly),
            "professional" => Ok(Personality::Professional),
            "technical" => Ok(Personality::Technical),
            "creative" => Ok(Personality::Creative),
            other => Err(format!("invalid personality: '{other}'")),
        }
    }
}

/// Identifier of a persisted chat session.
///
/// Assigned by the remote store on first persist, or generated locally
/// (UUID v7, time-sortable) for guest and fallback writes. Older guest
/// histories stored numeric ids; those are read back as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Integer(n) => Self(n.to_string()),
            RawId::Float(n) => Self(n.to_string()),
        })
    }
}

impl SessionId {
    /// Generate a fresh locally-assigned session id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single message within a chat session.
///
/// Messages are immutable once created and only ever appended. Ids are
/// time-derived and strictly increasing within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    /// Input looked like source code (user messages only).
    #[serde(default, alias = "hasCode")]
    pub contains_code: bool,
    /// Input looked like an actionable request (user messages only).
    #[serde(default, alias = "hasTask")]
    pub contains_task: bool,
    /// Task pulled out of the triggering input (assistant messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_task: Option<String>,
}

impl Message {
    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// The document body persisted for a session.
///
/// This is what the stores write: everything in a [`ChatSession`] except
/// the id, which the store owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub personality: Personality,
    #[serde(alias = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// One conversation: an ordered message list plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: SessionId,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub personality: Personality,
    #[serde(alias = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Assemble a session from a stored body and its id.
    pub fn from_body(id: SessionId, body: SessionBody) -> Self {
        Self {
            id,
            messages: body.messages,
            personality: body.personality,
            updated_at: body.updated_at,
        }
    }

    /// The document body for this session (a copy, the id is left out).
    pub fn body(&self) -> SessionBody {
        SessionBody {
            messages: self.messages.clone(),
            personality: self.personality,
            updated_at: self.updated_at,
        }
    }

    /// Text of the first message, used as the session title in listings.
    pub fn title(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.text.as_str())
            .unwrap_or(UNTITLED_SESSION)
    }
}
