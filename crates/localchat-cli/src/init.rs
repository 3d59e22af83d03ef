//! `localchat init` — write the default config and create the workspace.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use localchat_core::config::{get_config_path, load_config, save_config};
use localchat_core::utils::{get_data_path, get_history_path};

/// Run the init command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "LocalChat — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        // Defaults merged with any LOCALCHAT_* overrides in the environment.
        let config = load_config(None);
        save_config(&config, Some(&config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    }

    let config = load_config(Some(&config_path));
    let workspace = crate::helpers::expand_tilde(&config.agent.workspace);
    ensure_dir(&workspace, "workspace")?;

    ensure_dir(&get_data_path().join("sessions"), "sessions dir")?;
    if let Some(history_dir) = get_history_path().parent() {
        ensure_dir(history_dir, "history dir")?;
    }

    println!();
    println!(
        "{}",
        "  Setup complete! Run `localchat chat` to start chatting.".green()
    );
    println!();

    Ok(())
}

fn ensure_dir(path: &Path, label: &str) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create {label}: {}", path.display()))?;
    println!("  {} {label} at {}", "✓".green(), path.display());
    Ok(())
}
