//! `localchat status` — show the resolved configuration.

use anyhow::Result;
use colored::Colorize;

use localchat_core::config::{get_config_path, load_config, Config};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".dimmed().to_string()
        }
    );

    let workspace = crate::helpers::expand_tilde(&config.agent.workspace);
    println!(
        "  {:<18} {} {}",
        "Workspace:".bold(),
        workspace.display(),
        if workspace.is_dir() {
            "✓".green().to_string()
        } else {
            "(created on first chat)".dimmed().to_string()
        }
    );

    if let Some(path) = crate::system_prompt_path(&config) {
        println!(
            "  {:<18} {} {}",
            "System prompt:".bold(),
            path.display(),
            if path.is_file() {
                "✓".green().to_string()
            } else {
                "(not found)".red().to_string()
            }
        );
    }

    let key_status = if has_api_key(&config) {
        format!("{} (key set)", "✓".green())
    } else {
        "· none".dimmed().to_string()
    };
    println!("  {:<18} {}", "API key:".bold(), key_status);
    println!();

    crate::helpers::print_runtime_info(&config, &workspace);
    println!();

    Ok(())
}

/// Whether a non-empty API key is configured.
fn has_api_key(config: &Config) -> bool {
    config
        .model
        .api_key
        .as_deref()
        .is_some_and(|key| !key.is_empty())
}
