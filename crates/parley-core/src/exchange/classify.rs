//! Heuristics that flag code and actionable tasks in user input.

use std::sync::LazyLock;

use regex::Regex;

// ── Code detection ─────────────────────────────────────────────────────────

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```").unwrap());

static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]+`").unwrap());

/// A line opening with a declaration keyword followed by an identifier.
static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?:fn|def|function|class|import|#include|let|const|var|public|package|SELECT)\s+[\w<*(\x22]",
    )
    .unwrap()
});

/// A line ending in a statement terminator or a brace.
static TERMINATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[;{}]\s*$").unwrap());

static ARROW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w\)?\s*(?:=>|->)\s*\w").unwrap());

/// Whether `text` reads like source code.
pub fn looks_like_code(text: &str) -> bool {
    FENCE_RE.is_match(text)
        || INLINE_CODE_RE.is_match(text)
        || DECLARATION_RE.is_match(text)
        || TERMINATOR_RE.is_match(text)
        || ARROW_RE.is_match(text)
}

// ── Task detection ─────────────────────────────────────────────────────────

static REQUEST_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:write|create|build|make|implement|generate|add|fix|remind|schedule|plan|list|draft|send|set\s+up|organi[sz]e)\b",
    )
    .unwrap()
});

static TASK_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:remind me|i need to|todo|to-do|don'?t forget|can you|could you|please)\b")
        .unwrap()
});

/// Politeness prefixes removed by [`extract_task`]. Applied repeatedly, so
/// "Could you please ..." loses both.
static POLITE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:please|can you|could you|would you|remind me to|i need to)(?:[\s,]+|$)")
        .unwrap()
});

/// Whether `text` asks for something to be done.
pub fn looks_like_task(text: &str) -> bool {
    REQUEST_VERB_RE.is_match(text) || TASK_PHRASE_RE.is_match(text)
}

/// Pull the task out of a request.
///
/// Returns `None` when nothing is left after stripping prefixes and
/// trailing punctuation.
pub fn extract_task(text: &str) -> Option<String> {
    let mut rest = text.trim();
    while let Some(prefix) = POLITE_PREFIX_RE.find(rest) {
        rest = &rest[prefix.end()..];
    }
    let rest = rest.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '!' | '?' | ',' | ';' | ':'));

    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}
