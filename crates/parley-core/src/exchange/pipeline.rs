//! The message exchange pipeline.
//!
//! A user turn runs in three steps so the caller can render progress while
//! the reply is pending:
//!
//! 1. [`MessageExchange::submit`] validates and classifies the input, then
//!    appends and persists the user message.
//! 2. [`MessageExchange::generate`] waits out the typing delay and asks the
//!    generator for a reply. This is the only suspend point.
//! 3. [`MessageExchange::complete`] appends the reply, unless the active
//!    session was switched while it was pending.

use std::time::Duration;

use parley_types::chat::{Message, Personality, Sender, SessionId};
use parley_types::error::{ReplyError, ValidationError};
use tracing::{debug, info, warn};

use super::responder::ResponseGenerator;
use crate::chat::session::SessionLifecycle;
use crate::storage::session_store::SessionStore;

/// Reject input that has nothing but whitespace.
pub fn validate_input(input: &str) -> Result<&str, ValidationError> {
    if input.trim().is_empty() {
        Err(ValidationError::EmptyInput)
    } else {
        Ok(input)
    }
}

/// A user message that has been persisted and is waiting for its reply.
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub input: String,
    pub personality: Personality,
    /// Conversation before the user message.
    pub prior: Vec<Message>,
    pub contains_task: bool,
    pub session_id: SessionId,
    /// Lifecycle epoch when the user message was appended.
    pub epoch: u64,
}

/// What happened to a pending reply.
#[derive(Debug)]
pub enum ReplyOutcome {
    /// The reply was appended to the session it belongs to.
    Appended(Message),
    /// The active session changed while the reply was pending.
    Discarded,
    /// The generator failed. The user message stays in the session.
    Failed(ReplyError),
}

/// Drives user input through classification, generation and persistence.
pub struct MessageExchange<G> {
    generator: G,
    typing_delay: Duration,
}

impl<G: ResponseGenerator> MessageExchange<G> {
    /// Create a pipeline with no typing delay.
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            typing_delay: Duration::ZERO,
        }
    }

    /// Pause before every reply, for a more natural pace in interactive use.
    pub fn with_typing_delay(mut self, typing_delay: Duration) -> Self {
        self.typing_delay = typing_delay;
        self
    }

    pub fn typing_delay(&self) -> Duration {
        self.typing_delay
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Append and persist the user message for `input`.
    ///
    /// Returns `None` (and produces no message) for empty input.
    pub async fn submit<S: SessionStore>(
        &self,
        lifecycle: &mut SessionLifecycle<S>,
        input: &str,
    ) -> Option<PendingReply> {
        let input = match validate_input(input) {
            Ok(input) => input,
            Err(e) => {
                debug!(reason = %e, "Ignoring input");
                return None;
            }
        };

        let contains_code = self.generator.looks_like_code(input);
        let contains_task = self.generator.looks_like_task(input);
        let prior = lifecycle.messages().to_vec();
        let (id, timestamp) = lifecycle.stamp();

        let message = Message {
            id,
            text: input.to_string(),
            sender: Sender::User,
            timestamp,
            contains_code,
            contains_task,
            extracted_task: None,
        };
        let session_id = lifecycle.append_message(message).await;
        debug!(session_id = %session_id, contains_code, contains_task, "User message appended");

        Some(PendingReply {
            input: input.to_string(),
            personality: lifecycle.personality(),
            prior,
            contains_task,
            session_id,
            epoch: lifecycle.epoch(),
        })
    }

    /// Produce the reply text for a pending user message.
    pub async fn generate(&self, pending: &PendingReply) -> Result<String, ReplyError> {
        if !self.typing_delay.is_zero() {
            tokio::time::sleep(self.typing_delay).await;
        }
        self.generator
            .reply(&pending.input, pending.personality, &pending.prior)
            .await
    }

    /// Append the reply to the session it was generated for.
    pub async fn complete<S: SessionStore>(
        &self,
        lifecycle: &mut SessionLifecycle<S>,
        pending: PendingReply,
        reply: Result<String, ReplyError>,
    ) -> ReplyOutcome {
        if lifecycle.epoch() != pending.epoch {
            info!(
                session_id = %pending.session_id,
                "Active session changed while reply was pending, discarding reply"
            );
            return ReplyOutcome::Discarded;
        }

        let text = match reply {
            Ok(text) => text,
            Err(e) => {
                warn!(session_id = %pending.session_id, error = %e, "Reply generation failed");
                return ReplyOutcome::Failed(e);
            }
        };

        let extracted_task = if pending.contains_task {
            self.generator.extract_task(&pending.input)
        } else {
            None
        };
        let (id, timestamp) = lifecycle.stamp();
        let message = Message {
            id,
            text,
            sender: Sender::Assistant,
            timestamp,
            contains_code: false,
            contains_task: false,
            extracted_task,
        };
        lifecycle.append_message(message.clone()).await;
        ReplyOutcome::Appended(message)
    }

    /// Run a whole turn: submit, generate, complete.
    ///
    /// Returns `None` for empty input.
    pub async fn send<S: SessionStore>(
        &self,
        lifecycle: &mut SessionLifecycle<S>,
        input: &str,
    ) -> Option<ReplyOutcome> {
        let pending = self.submit(lifecycle, input).await?;
        let reply = self.generate(&pending).await;
        Some(self.complete(lifecycle, pending, reply).await)
    }
}
