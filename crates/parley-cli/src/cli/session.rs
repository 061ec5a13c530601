//! Session browsing CLI commands: list, show, delete.
//!
//! Operates on the history index of one identity through the session
//! lifecycle, so remote and local backends behave the same.

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;
use parley_core::storage::session_store::SessionStore;
use parley_types::chat::{ChatSession, Message, Sender};

use crate::state::ChatLifecycle;

/// Characters of a session id shown in tables.
const SHORT_ID_LEN: usize = 8;

/// Find a session by full id or unique id prefix.
pub fn find_session<'a>(sessions: &'a [ChatSession], query: &str) -> Result<&'a ChatSession> {
    let query = query.trim();
    if let Some(exact) = sessions.iter().find(|s| s.id.as_str() == query) {
        return Ok(exact);
    }
    if query.is_empty() {
        anyhow::bail!("Session id must not be empty");
    }

    let mut matches = sessions.iter().filter(|s| s.id.as_str().starts_with(query));
    match (matches.next(), matches.next()) {
        (Some(session), None) => Ok(session),
        (Some(_), Some(_)) => anyhow::bail!("Session id '{query}' is ambiguous, use more characters"),
        (None, _) => anyhow::bail!("No session matches '{query}'"),
    }
}

/// First characters of a session id.
pub fn short_id(session: &ChatSession) -> &str {
    let id = session.id.as_str();
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

/// Shorten `text` to at most `max` characters on one line.
pub fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max {
        let head: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else if text.lines().nth(1).is_some() {
        format!("{line}...")
    } else {
        line.to_string()
    }
}

/// Print one message the way the chat loop does.
pub fn print_message(message: &Message, assistant_label: &str) {
    let label = match message.sender {
        Sender::User => format!("{}", style("You").green().bold()),
        Sender::Assistant => format!("{}", style(assistant_label).cyan().bold()),
    };
    let time = message.timestamp.format("%H:%M");
    println!("  {} {}", label, style(time).dim());
    for line in message.text.lines() {
        println!("    {line}");
    }
    if let Some(task) = &message.extracted_task {
        println!("    {} {}", style("Task:").yellow().bold(), task);
    }
    println!();
}

/// List sessions in the index, most recent first.
///
/// # Examples
///
/// ```bash
/// parley sessions --guest list
/// parley sessions --email ada@example.com list --json
/// ```
pub fn list_sessions(lifecycle: &ChatLifecycle, json: bool) -> Result<()> {
    let sessions = lifecycle.history();

    if json {
        println!("{}", serde_json::to_string_pretty(sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions for {}. Start one with: {}",
            style("i").blue().bold(),
            style(lifecycle.identity().display_name()).cyan(),
            style("parley chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Personality").fg(Color::White),
    ]);

    for session in sessions {
        table.add_row(vec![
            Cell::new(short_id(session)).fg(Color::DarkGrey),
            Cell::new(preview(session.title(), 40)).fg(Color::Cyan),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::White),
            Cell::new(session.messages.len().to_string()).fg(Color::White),
            Cell::new(session.personality.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!(
        "  Sessions for {} ({} storage)",
        style(lifecycle.identity().display_name()).cyan().bold(),
        lifecycle.store().backend_name()
    );
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print a session transcript.
pub fn show_session(lifecycle: &ChatLifecycle, query: &str, json: bool) -> Result<()> {
    let session = find_session(lifecycle.history(), query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(preview(session.title(), 60)).cyan().bold());
    println!(
        "  {} {}  {} {}  {} {}",
        style("ID:").bold(),
        style(&session.id).dim(),
        style("Personality:").bold(),
        session.personality,
        style("Updated:").bold(),
        session.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();

    for message in &session.messages {
        print_message(message, "Parley");
    }

    Ok(())
}

/// Delete a session, asking first unless `force` is set.
pub async fn delete_session(lifecycle: &mut ChatLifecycle, query: &str, force: bool, json: bool) -> Result<()> {
    let session = find_session(lifecycle.history(), query)?;
    let session_id = session.id.clone();
    let title = preview(session.title(), 40);

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete session '{title}' ({} messages)?", session.messages.len()))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

        if !confirmed {
            println!("  {}", style("Cancelled.").dim());
            return Ok(());
        }
    }

    let removed = lifecycle.delete_session(&session_id).await;

    if json {
        let result = serde_json::json!({
            "deleted": removed,
            "id": session_id,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "\n  {} Deleted session '{}'\n",
            style("✓").green().bold(),
            style(title).cyan()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_types::chat::{Personality, SessionId};

    fn session(id: &str, first: Option<&str>) -> ChatSession {
        ChatSession {
            id: SessionId::from(id),
            messages: first
                .map(|text| {
                    vec![Message {
                        id: 1,
                        text: text.to_string(),
                        sender: Sender::User,
                        timestamp: Utc::now(),
                        contains_code: false,
                        contains_task: false,
                        extracted_task: None,
                    }]
                })
                .unwrap_or_default(),
            personality: Personality::Friendly,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_find_session_by_prefix() {
        let sessions = vec![session("0192aaaa-1", None), session("0192bbbb-2", None)];

        assert_eq!(find_session(&sessions, "0192bb").unwrap().id.as_str(), "0192bbbb-2");
        assert_eq!(find_session(&sessions, "0192aaaa-1").unwrap().id.as_str(), "0192aaaa-1");
    }

    #[test]
    fn test_find_session_errors() {
        let sessions = vec![session("0192aaaa-1", None), session("0192bbbb-2", None)];

        let ambiguous = find_session(&sessions, "0192").unwrap_err();
        assert!(ambiguous.to_string().contains("ambiguous"));

        let missing = find_session(&sessions, "ffff").unwrap_err();
        assert!(missing.to_string().contains("No session matches"));

        assert!(find_session(&sessions, "  ").is_err());
    }

    #[test]
    fn test_exact_match_wins_over_prefix() {
        let sessions = vec![session("abc", None), session("abcdef", None)];
        assert_eq!(find_session(&sessions, "abc").unwrap().id.as_str(), "abc");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id(&session("0192aaaa-bbbb", None)), "0192aaaa");
        assert_eq!(short_id(&session("abc", None)), "abc");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("Hello", 40), "Hello");
        assert_eq!(preview("line one\nline two", 40), "line one...");
        assert_eq!(preview("abcdefghij", 8), "abcde...");
        assert_eq!(preview("", 8), "");
    }

    #[test]
    fn test_untitled_session_preview() {
        assert_eq!(preview(session("x", None).title(), 40), "New Chat");
        assert_eq!(preview(session("x", Some("Hi there")).title(), 40), "Hi there");
    }
}
