//! Configuration schema.
//!
//! Hierarchy: `Config` → `ModelConfig`, `AgentConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.localchat/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub model: ModelConfig,
    pub agent: AgentConfig,
}

// ─────────────────────────────────────────────
// Model backend
// ─────────────────────────────────────────────

/// Connection settings for the OpenAI-compatible model server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// Base URL of the server (e.g. llama.cpp `llama-server`).
    pub api_base: String,
    /// Bearer token; most local servers ignore it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model identifier sent in each request.
    pub name: String,
    /// Request incremental (SSE) delivery.
    pub stream: bool,
    /// HTTP timeout in seconds for a single generation.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8080/v1".to_string(),
            api_key: None,
            name: "local-model".to_string(),
            stream: true,
            timeout_secs: 600,
        }
    }
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

/// Conversation loop settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// Sandbox directory for the file tools.
    pub workspace: String,
    /// Optional file whose content is appended to the system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_file: Option<String>,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Generate/execute round-trips allowed per user turn.
    pub max_tool_iterations: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            workspace: "./workspace".to_string(),
            system_prompt_file: None,
            temperature: 0.7,
            max_tokens: 2048,
            max_tool_iterations: 10,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.api_base, "http://127.0.0.1:8080/v1");
        assert!(config.model.stream);
        assert_eq!(config.agent.workspace, "./workspace");
        assert_eq!(config.agent.max_tokens, 2048);
        assert_eq!(config.agent.temperature, 0.7);
        assert_eq!(config.agent.max_tool_iterations, 10);
    }

    #[test]
    fn test_config_from_json_camel_case() {
        let json = r#"{
            "model": { "apiBase": "http://localhost:11434/v1", "name": "gemma3", "stream": false },
            "agent": { "maxTokens": 512, "systemPromptFile": "prompt.txt" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.model.api_base, "http://localhost:11434/v1");
        assert_eq!(config.model.name, "gemma3");
        assert!(!config.model.stream);
        assert_eq!(config.agent.max_tokens, 512);
        assert_eq!(config.agent.system_prompt_file.as_deref(), Some("prompt.txt"));
        // Untouched fields keep their defaults
        assert_eq!(config.agent.temperature, 0.7);
        assert_eq!(config.model.timeout_secs, 600);
    }

    #[test]
    fn test_config_json_uses_camel_case() {
        let raw = serde_json::to_value(Config::default()).unwrap();
        assert!(raw["agent"].get("maxToolIterations").is_some());
        assert!(raw["agent"].get("max_tool_iterations").is_none());
        assert!(raw["model"].get("apiKey").is_none());
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }
}
