//! Global configuration types for Parley.
//!
//! `ParleyConfig` represents the `config.toml` in the data directory that
//! controls the default personality, the typing delay, and the remote store.

use serde::{Deserialize, Serialize};

use crate::chat::Personality;

/// Top-level configuration for the Parley client.
///
/// Loaded from `~/.parley/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParleyConfig {
    /// Personality used for new conversations.
    #[serde(default)]
    pub default_personality: Personality,

    /// Artificial "typing" delay before a reply is shown, in milliseconds.
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    /// Whether signed-in users replicate their history to the remote store.
    #[serde(default = "default_remote_enabled")]
    pub remote_enabled: bool,

    /// Connection URL of the remote document store.
    ///
    /// Defaults to `sqlite://{data_dir}/remote.db` when unset.
    #[serde(default)]
    pub remote_database_url: Option<String>,

    /// Failed sign-ins allowed per email before the gateway rate-limits it.
    #[serde(default = "default_max_failed_sign_ins")]
    pub max_failed_sign_ins: u32,
}

fn default_typing_delay_ms() -> u64 {
    800
}

fn default_remote_enabled() -> bool {
    true
}

fn default_max_failed_sign_ins() -> u32 {
    5
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            default_personality: Personality::default(),
            typing_delay_ms: default_typing_delay_ms(),
            remote_enabled: default_remote_enabled(),
            remote_database_url: None,
            max_failed_sign_ins: default_max_failed_sign_ins(),
        }
    }
}
