//! ResponseGenerator trait and the built-in rule-based responder.

use std::sync::LazyLock;

use parley_types::chat::{Message, Personality};
use parley_types::error::ReplyError;
use regex::Regex;

use super::classify;

/// Produces reply text for a user message.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). The
/// classification helpers default to the shared heuristics in
/// [`classify`]; generators can override them.
pub trait ResponseGenerator: Send + Sync {
    /// Generate a reply to `input`, given the conversation before it.
    fn reply(
        &self,
        input: &str,
        personality: Personality,
        prior: &[Message],
    ) -> impl std::future::Future<Output = Result<String, ReplyError>> + Send;

    fn looks_like_code(&self, text: &str) -> bool {
        classify::looks_like_code(text)
    }

    fn looks_like_task(&self, text: &str) -> bool {
        classify::looks_like_task(text)
    }

    fn extract_task(&self, text: &str) -> Option<String> {
        classify::extract_task(text)
    }
}

static GREETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:hi|hello|hey|howdy|greetings|good (?:morning|afternoon|evening))\b").unwrap()
});

static THANKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:thanks|thank you|thx|appreciate it)\b").unwrap());

static HELP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*help\s*[.!?]*\s*$|\bwhat can you do\b|\bhow do(?:es)? this work\b").unwrap()
});

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\?\s*$|^\s*(?:who|what|when|where|why|how|which|is|are|do|does|can|should)\b")
        .unwrap()
});

/// Which canned reply a message gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyRule {
    Greeting,
    Thanks,
    Help,
    Code,
    Task,
    Question,
    Default,
}

/// Deterministic responder: the first matching rule picks a template, and
/// the personality picks its wording.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedResponder;

impl RuleBasedResponder {
    pub fn new() -> Self {
        Self
    }

    /// Rule for `input`. Checked in order: greeting, thanks, help, code,
    /// task, question, then the default.
    pub fn rule_for(&self, input: &str) -> ReplyRule {
        if GREETING_RE.is_match(input) {
            ReplyRule::Greeting
        } else if THANKS_RE.is_match(input) {
            ReplyRule::Thanks
        } else if HELP_RE.is_match(input) {
            ReplyRule::Help
        } else if self.looks_like_code(input) {
            ReplyRule::Code
        } else if self.looks_like_task(input) {
            ReplyRule::Task
        } else if QUESTION_RE.is_match(input) {
            ReplyRule::Question
        } else {
            ReplyRule::Default
        }
    }

    /// Render the reply without the async wrapper.
    pub fn compose(&self, input: &str, personality: Personality, prior: &[Message]) -> String {
        let returning = prior.iter().any(Message::is_from_user);
        match self.rule_for(input) {
            ReplyRule::Greeting => greeting(personality, returning),
            ReplyRule::Thanks => thanks(personality),
            ReplyRule::Help => help(personality),
            ReplyRule::Code => code(personality),
            ReplyRule::Task => {
                let task = self
                    .extract_task(input)
                    .unwrap_or_else(|| input.trim().to_string());
                task_reply(personality, &task)
            }
            ReplyRule::Question => question(personality),
            ReplyRule::Default => fallback(personality, prior.len()),
        }
    }
}

impl ResponseGenerator for RuleBasedResponder {
    async fn reply(
        &self,
        input: &str,
        personality: Personality,
        prior: &[Message],
    ) -> Result<String, ReplyError> {
        Ok(self.compose(input, personality, prior))
    }
}

fn greeting(personality: Personality, returning: bool) -> String {
    let text = match (personality, returning) {
        (Personality::Friendly, false) => "Hey there! 👋 Great to see you. What's on your mind today?",
        (Personality::Friendly, true) => "Hi again! What else can I help you with?",
        (Personality::Professional, false) => "Good day. How may I assist you?",
        (Personality::Professional, true) => "Hello again. What would you like to address next?",
        (Personality::Technical, false) => "Hello. Ready when you are: share code, errors, or a problem statement.",
        (Personality::Technical, true) => "Hello again. What's the next problem?",
        (Personality::Creative, false) => "Well hello, wanderer! ✨ What shall we dream up today?",
        (Personality::Creative, true) => "Back for another adventure? ✨ Where to next?",
    };
    text.to_string()
}

fn thanks(personality: Personality) -> String {
    let text = match personality {
        Personality::Friendly => "You're so welcome! 😊 Happy to help anytime.",
        Personality::Professional => "You're welcome. Let me know if there is anything else you need.",
        Personality::Technical => "No problem. Ping me if anything else comes up.",
        Personality::Creative => "My pleasure! Every question is a little spark. 🌟",
    };
    text.to_string()
}

fn help(personality: Personality) -> String {
    let intro = match personality {
        Personality::Friendly => "I'd love to help! Here's what I can do:",
        Personality::Professional => "Here is an overview of what I can assist with:",
        Personality::Technical => "Capabilities:",
        Personality::Creative => "Here's my bag of tricks:",
    };
    format!(
        "{intro}\n- answer questions\n- look over code snippets\n- turn requests into tasks you can track\n- keep your conversation history between sessions"
    )
}

fn code(personality: Personality) -> String {
    let text = match personality {
        Personality::Friendly => {
            "Ooh, code! 💻 I can see you're working on something. Tell me what it should do and where it's going wrong."
        }
        Personality::Professional => {
            "I see you've shared some code. Please describe the expected behaviour and any errors you are encountering."
        }
        Personality::Technical => {
            "Code detected. Include the language, the expected vs. actual output, and any compiler or runtime errors."
        }
        Personality::Creative => {
            "Code is poetry in disguise! 🎨 Tell me the story this snippet is trying to tell."
        }
    };
    text.to_string()
}

fn task_reply(personality: Personality, task: &str) -> String {
    match personality {
        Personality::Friendly => format!("On it! 📝 I've noted this task for you: \"{task}\"."),
        Personality::Professional => format!("Understood. I have recorded the following task: \"{task}\"."),
        Personality::Technical => format!("Task captured: \"{task}\"."),
        Personality::Creative => format!("A new quest appears! ✨ \"{task}\" has been added to your journey."),
    }
}

fn question(personality: Personality) -> String {
    let text = match personality {
        Personality::Friendly => "Great question! 🤔 Let me think about that with you. Can you tell me a bit more?",
        Personality::Professional => "That is a good question. Could you provide some additional context?",
        Personality::Technical => "Need more detail to answer precisely. What are the constraints?",
        Personality::Creative => "Ooh, a mystery to unravel! 🔮 Give me a few more clues.",
    };
    text.to_string()
}

fn fallback(personality: Personality, prior_len: usize) -> String {
    let text = match personality {
        Personality::Friendly => "Interesting! Tell me more. 😊",
        Personality::Professional => "Noted. How would you like to proceed?",
        Personality::Technical => "Acknowledged. What's the next step?",
        Personality::Creative => "Fascinating! That opens up so many possibilities. 🌈",
    };
    if prior_len >= 10 {
        format!("{text} We've covered a lot in this conversation ({prior_len} messages so far).")
    } else {
        text.to_string()
    }
}
