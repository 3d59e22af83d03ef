//! Shared CLI helpers — path expansion, console output, banners.

use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;

use localchat_agent::{TurnObserver, TurnOutcome};
use localchat_core::config::Config;
use localchat_core::types::{GenerationStats, ToolCall};
use localchat_core::utils::truncate_string;

/// Characters of a tool result echoed to the console.
const RESULT_PREVIEW_CHARS: usize = 200;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ─────────────────────────────────────────────
// Console observer
// ─────────────────────────────────────────────

/// Echoes a turn to the terminal as it happens.
#[derive(Debug)]
pub struct ConsoleObserver {
    /// Whether the cursor sits at the start of a line.
    at_line_start: bool,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self {
            at_line_start: true,
        }
    }

    fn break_line(&mut self) {
        if !self.at_line_start {
            println!();
            self.at_line_start = true;
        }
    }

    /// Close the turn with the stats line.
    pub fn finish_turn(&mut self, outcome: &TurnOutcome) {
        if outcome.hit_iteration_limit {
            self.break_line();
            println!("{}", outcome.reply);
        }
        self.break_line();
        println!();
        println!("  {}", format_stats(&outcome.stats).dimmed());
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnObserver for ConsoleObserver {
    fn on_text(&mut self, text: &str) {
        print!("{text}");
        let _ = std::io::stdout().flush();
        self.at_line_start = text.ends_with('\n');
    }

    fn on_tool_call(&mut self, call: &ToolCall) {
        self.break_line();
        println!(
            "\n  {} {} {}",
            "TOOL CALL:".yellow().bold(),
            call.name,
            call.arguments_json().dimmed()
        );
    }

    fn on_tool_result(&mut self, _call: &ToolCall, result: &str) {
        let preview = truncate_string(result, RESULT_PREVIEW_CHARS);
        let label = if result.starts_with("Error:") {
            "TOOL RESULT:".red().bold()
        } else {
            "TOOL RESULT:".green().bold()
        };
        println!("  {label} {preview}");
        println!();
        self.at_line_start = true;
    }
}

/// `[N tokens, X tok/s, Ys]`
pub fn format_stats(stats: &GenerationStats) -> String {
    format!(
        "[{} tokens, {:.1} tok/s, {:.2}s]",
        stats.completion_tokens,
        stats.tokens_per_second(),
        stats.duration_seconds
    )
}

// ─────────────────────────────────────────────
// Banners
// ─────────────────────────────────────────────

/// Print the resolved backend and limits.
pub fn print_runtime_info(config: &Config, workspace: &Path) {
    let rule = "=".repeat(50);
    println!("{}", rule.dimmed());
    println!("{}", "LocalChat - Runtime Information".cyan().bold());
    println!("{}", rule.dimmed());
    println!("  {:<14} {}", "Backend:", config.model.api_base);
    println!("  {:<14} {}", "Model:", config.model.name);
    println!(
        "  {:<14} {}",
        "Streaming:",
        if config.model.stream { "on" } else { "off" }
    );
    println!("  {:<14} {}", "Workspace:", workspace.display());
    println!(
        "  {:<14} temp {} | max_tokens {} | max tool iterations {}",
        "Limits:",
        config.agent.temperature,
        config.agent.max_tokens,
        config.agent.max_tool_iterations
    );
    println!("{}", rule.dimmed());
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "{}  v{}",
        "LocalChat Ready!".cyan().bold(),
        version.dimmed()
    );
    println!(
        "{}",
        "Type 'quit' or 'exit' to end the session, 'clear' to clear conversation history.".dimmed()
    );
    println!("{}", "-".repeat(50));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
