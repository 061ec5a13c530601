//! Welcome banner display for chat sessions.

use console::style;
use parley_types::chat::Personality;
use parley_types::identity::Identity;

/// Print the welcome banner at the start of a chat.
///
/// Shows who is signed in, where history is stored, the personality and
/// how many past sessions exist, plus a hint about slash commands.
pub fn print_welcome_banner(identity: &Identity, storage: &str, personality: Personality, sessions: usize) {
    println!();
    println!("  {} {}", style("*").cyan().bold(), style("Parley").cyan().bold());
    println!("  {}", style("A personality-driven chat assistant").dim());
    println!();
    println!("  {}  {}", style("User:").bold(), identity.display_name());
    println!("  {}  {}", style("Storage:").bold(), style(storage).dim());
    println!("  {}  {}", style("Personality:").bold(), personality);
    if sessions > 0 {
        println!(
            "  {}  {} saved (/history to browse)",
            style("Sessions:").bold(),
            sessions
        );
    }
    if identity.is_guest() {
        println!();
        println!(
            "  {}",
            style("Guest mode: history is kept on this device only").yellow()
        );
    }
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
