//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use localchat_agent::ConversationEngine;
use localchat_core::utils::get_history_path;

use crate::helpers::{self, ConsoleObserver};

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// What the REPL should do with one input line.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Skip,
    Exit,
    Clear,
    Chat(&'a str),
}

fn classify(input: &str) -> ReplCommand<'_> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ReplCommand::Skip;
    }
    let lower = trimmed.to_lowercase();
    if EXIT_COMMANDS.contains(&lower.as_str()) {
        ReplCommand::Exit
    } else if lower == "clear" {
        ReplCommand::Clear
    } else {
        ReplCommand::Chat(trimmed)
    }
}

/// Run the interactive REPL loop.
pub async fn run(mut engine: ConversationEngine, session: Option<&Path>) -> Result<()> {
    helpers::print_banner();

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("\nYou: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("\nInterrupted. Goodbye!");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nGoodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        match classify(&input) {
            ReplCommand::Skip => continue,
            ReplCommand::Exit => {
                println!("Goodbye!");
                break;
            }
            ReplCommand::Clear => {
                engine.clear_history();
                if let Some(path) = session {
                    crate::persist_session(&engine, path);
                }
                println!("{}", "Conversation history cleared.".dimmed());
            }
            ReplCommand::Chat(message) => {
                let _ = editor.add_history_entry(message);
                debug!(input = message, "processing input");

                print!("\n{} ", "Assistant:".cyan().bold());
                let mut observer = ConsoleObserver::new();
                match engine.chat(message, &mut observer).await {
                    Ok(outcome) => observer.finish_turn(&outcome),
                    Err(e) => eprintln!("\n{} {e:#}", "Error:".red().bold()),
                }

                if let Some(path) = session {
                    crate::persist_session(&engine, path);
                }
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = get_history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = get_history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
