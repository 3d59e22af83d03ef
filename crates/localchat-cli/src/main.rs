//! LocalChat CLI — entry point.
//!
//! # Commands
//!
//! - `localchat chat [-m MESSAGE] [-w WORKSPACE] ...` — single-shot or REPL chat
//! - `localchat status` — show the resolved runtime configuration
//! - `localchat init` — write the default config and create the workspace

mod helpers;
mod init;
mod repl;
mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use localchat_agent::{ContextBuilder, ConversationEngine, ToolExecutor};
use localchat_core::config::{load_config, Config};
use localchat_core::session::{load_session, save_session};
use localchat_providers::{HttpProvider, LlmRequestConfig};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// LocalChat — chat with a local model that can read and write workspace files
#[derive(Parser)]
#[command(name = "localchat", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the model (single-shot or interactive REPL)
    Chat(ChatArgs),

    /// Show the resolved runtime configuration
    Status,

    /// Write the default config and create the workspace
    Init,
}

#[derive(Args, Debug, Default)]
struct ChatArgs {
    /// Single message (non-interactive). Omit for REPL mode.
    #[arg(short, long)]
    message: Option<String>,

    /// Sandbox directory for file tools
    #[arg(short, long)]
    workspace: Option<String>,

    /// Path to a system prompt file appended to the tool instructions
    #[arg(long)]
    system: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f64>,

    /// Maximum tokens to generate per response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Model identifier sent to the server
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the OpenAI-compatible server
    #[arg(long)]
    api_base: Option<String>,

    /// Session file: history is loaded at start and saved after every turn
    #[arg(long)]
    session: Option<PathBuf>,

    /// Request whole responses instead of streaming
    #[arg(long, default_value_t = false)]
    no_stream: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    logs: bool,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Chat(args) if args.logs);
    init_logging(verbose);

    match cli.command {
        Commands::Chat(args) => run_chat(args).await,
        Commands::Status => status::run(),
        Commands::Init => init::run(),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(args: ChatArgs) -> Result<()> {
    let mut config = load_config(None);
    apply_overrides(&mut config, &args);

    let system_prompt = system_prompt_path(&config).and_then(|path| load_system_prompt(&path));

    let mut engine = build_engine(&config, system_prompt.as_deref())?;

    if let Some(ref path) = args.session {
        restore_session(&mut engine, path)?;
    }

    match args.message {
        Some(msg) => {
            // Single-shot mode
            info!("processing single message");
            let mut observer = helpers::ConsoleObserver::new();
            let outcome = engine
                .chat(&msg, &mut observer)
                .await
                .context("chat turn failed")?;
            observer.finish_turn(&outcome);
            if let Some(ref path) = args.session {
                persist_session(&engine, path);
            }
        }
        None => {
            helpers::print_runtime_info(&config, engine.tools().workspace());
            repl::run(engine, args.session.as_deref()).await?;
        }
    }

    Ok(())
}

/// Command-line flags override config file and environment.
fn apply_overrides(config: &mut Config, args: &ChatArgs) {
    if let Some(ref workspace) = args.workspace {
        config.agent.workspace = workspace.clone();
    }
    if let Some(ref system) = args.system {
        config.agent.system_prompt_file = Some(system.clone());
    }
    if let Some(temperature) = args.temperature {
        config.agent.temperature = temperature;
    }
    if let Some(max_tokens) = args.max_tokens {
        config.agent.max_tokens = max_tokens;
    }
    if let Some(ref model) = args.model {
        config.model.name = model.clone();
    }
    if let Some(ref api_base) = args.api_base {
        config.model.api_base = api_base.clone();
    }
    if args.no_stream {
        config.model.stream = false;
    }
}

/// The configured system prompt file, with `~` expanded.
pub(crate) fn system_prompt_path(config: &Config) -> Option<PathBuf> {
    config
        .agent
        .system_prompt_file
        .as_deref()
        .map(helpers::expand_tilde)
}

/// Read the user system prompt. A missing or unreadable file is a warning.
fn load_system_prompt(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "system prompt not loaded");
            eprintln!(
                "{} System prompt file not found: {}",
                "Warning:".yellow().bold(),
                path.display()
            );
            None
        }
    }
}

/// Build a `ConversationEngine` from the resolved configuration.
pub fn build_engine(config: &Config, system_prompt: Option<&str>) -> Result<ConversationEngine> {
    let workspace = helpers::expand_tilde(&config.agent.workspace);
    let tools = ToolExecutor::new(&workspace)
        .with_context(|| format!("failed to create workspace: {}", workspace.display()))?;

    let provider = HttpProvider::new(&config.model)?;

    let request_config = LlmRequestConfig {
        max_tokens: config.agent.max_tokens,
        temperature: config.agent.temperature,
    };

    Ok(
        ConversationEngine::new(Arc::new(provider), tools, ContextBuilder::new(system_prompt))
            .with_request_config(request_config)
            .with_max_iterations(config.agent.max_tool_iterations as usize),
    )
}

/// Load history from `path` if it exists.
fn restore_session(engine: &mut ConversationEngine, path: &Path) -> Result<()> {
    if !path.exists() {
        info!(path = %path.display(), "new session file");
        return Ok(());
    }
    let doc = load_session(path)?;
    info!(
        path = %path.display(),
        messages = doc.messages.len(),
        saved = %doc.timestamp,
        "session restored"
    );
    engine.replace_history(doc.messages);
    Ok(())
}

/// Save history to `path`; failures are reported but never end the session.
pub(crate) fn persist_session(engine: &ConversationEngine, path: &Path) {
    if let Err(e) = save_session(path, engine.history()) {
        warn!(error = %e, "failed to save session");
        eprintln!("{} {e}", "Warning:".yellow().bold());
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("localchat=debug,warn")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
