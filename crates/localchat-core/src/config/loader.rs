//! Config loader — reads `~/.localchat/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.localchat/config.json`
//! 3. Environment variables `LOCALCHAT_<SECTION>__<FIELD>` (override JSON)
//!
//! Command-line flags are applied on top by the CLI.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path (or `path`) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `LOCALCHAT_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `LOCALCHAT_MODEL__API_BASE` → `model.api_base`
/// - `LOCALCHAT_MODEL__API_KEY` → `model.api_key`
/// - `LOCALCHAT_MODEL__NAME` → `model.name`
/// - `LOCALCHAT_MODEL__STREAM` → `model.stream`
/// - `LOCALCHAT_AGENT__WORKSPACE` → `agent.workspace`
/// - `LOCALCHAT_AGENT__TEMPERATURE` → `agent.temperature`
/// - `LOCALCHAT_AGENT__MAX_TOKENS` → `agent.max_tokens`
/// - `LOCALCHAT_AGENT__MAX_TOOL_ITERATIONS` → `agent.max_tool_iterations`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("LOCALCHAT_MODEL__API_BASE") {
        config.model.api_base = val;
    }
    if let Ok(val) = std::env::var("LOCALCHAT_MODEL__API_KEY") {
        config.model.api_key = Some(val);
    }
    if let Ok(val) = std::env::var("LOCALCHAT_MODEL__NAME") {
        config.model.name = val;
    }
    if let Ok(val) = std::env::var("LOCALCHAT_MODEL__STREAM") {
        config.model.stream = parse_bool(&val);
    }

    if let Ok(val) = std::env::var("LOCALCHAT_AGENT__WORKSPACE") {
        config.agent.workspace = val;
    }
    if let Ok(val) = std::env::var("LOCALCHAT_AGENT__TEMPERATURE") {
        match val.parse::<f64>() {
            Ok(t) => config.agent.temperature = t,
            Err(_) => warn!(value = %val, "ignoring invalid LOCALCHAT_AGENT__TEMPERATURE"),
        }
    }
    if let Ok(val) = std::env::var("LOCALCHAT_AGENT__MAX_TOKENS") {
        match val.parse::<u32>() {
            Ok(n) => config.agent.max_tokens = n,
            Err(_) => warn!(value = %val, "ignoring invalid LOCALCHAT_AGENT__MAX_TOKENS"),
        }
    }
    if let Ok(val) = std::env::var("LOCALCHAT_AGENT__MAX_TOOL_ITERATIONS") {
        match val.parse::<u32>() {
            Ok(n) => config.agent.max_tool_iterations = n,
            Err(_) => warn!(value = %val, "ignoring invalid LOCALCHAT_AGENT__MAX_TOOL_ITERATIONS"),
        }
    }

    config
}

fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "model": { "name": "qwen2.5-7b" },
            "agent": { "maxTokens": 1024, "workspace": "/tmp/ws" }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.model.name, "qwen2.5-7b");
        assert_eq!(config.agent.max_tokens, 1024);
        assert_eq!(config.agent.workspace, "/tmp/ws");
        // Default preserved
        assert_eq!(config.agent.temperature, 0.7);
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.model.name = "llama-3.2-3b".to_string();
        config.model.api_key = Some("secret".to_string());
        config.agent.max_tool_iterations = 4;

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["model"].get("apiBase").is_some());
        assert!(raw["model"].get("api_base").is_none());
    }

    #[test]
    fn test_env_override_model_name() {
        std::env::set_var("LOCALCHAT_MODEL__NAME", "env-model");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.model.name, "env-model");
        std::env::remove_var("LOCALCHAT_MODEL__NAME");
    }

    #[test]
    fn test_env_override_stream_flag() {
        std::env::set_var("LOCALCHAT_MODEL__STREAM", "false");
        let config = apply_env_overrides(Config::default());
        assert!(!config.model.stream);
        std::env::remove_var("LOCALCHAT_MODEL__STREAM");
    }

    #[test]
    fn test_env_override_invalid_number_ignored() {
        std::env::set_var("LOCALCHAT_AGENT__MAX_TOKENS", "lots");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.agent.max_tokens, 2048);
        std::env::remove_var("LOCALCHAT_AGENT__MAX_TOKENS");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("1"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" yes "));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("nope"));
    }
}
