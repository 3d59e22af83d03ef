//! HTTP provider for OpenAI-compatible local model servers.
//!
//! Talks to any `/chat/completions` endpoint: llama.cpp `llama-server`,
//! Ollama, vLLM, LM Studio. With streaming enabled the response is consumed
//! as server-sent events; otherwise the single JSON completion becomes a
//! one-fragment stream.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error};

use localchat_core::config::ModelConfig;
use localchat_core::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Fragment, StreamOptions,
};

use crate::sse::fragments_from_sse;
use crate::traits::{FragmentStream, LlmProvider, LlmRequestConfig};

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A model backend reached over an OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"http://127.0.0.1:8080/v1"`).
    api_base: String,
    /// Optional bearer token.
    api_key: Option<String>,
    /// Model identifier sent with each request.
    model: String,
    /// Whether to request SSE streaming.
    stream: bool,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("stream", &self.stream)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider from the model section of the config.
    pub fn new(config: &ModelConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(HttpProvider {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.name.clone(),
            stream: config.stream,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        config: &LlmRequestConfig,
    ) -> anyhow::Result<FragmentStream> {
        debug!(
            model = %self.model,
            messages = messages.len(),
            stream = self.stream,
            "Calling LLM"
        );

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stream: self.stream,
            stream_options: self.stream.then_some(StreamOptions {
                include_usage: true,
            }),
        };

        let mut request = self.client.post(self.completions_url()).json(&request_body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(api_base = %self.api_base, error = %e, "HTTP request failed");
            anyhow::anyhow!("Error calling LLM: {e}")
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %error_text, "API error");
            anyhow::bail!("Error calling LLM: {} — {}", status, error_text);
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        if is_event_stream {
            return Ok(fragments_from_sse(response.bytes_stream()));
        }

        // Non-streaming request, or a server that ignored `stream: true`.
        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to parse LLM response");
                anyhow::anyhow!("Error parsing LLM response: {e}")
            })?;
        let fragment = Fragment::from(completion);
        debug!(
            has_content = fragment.content.is_some(),
            has_usage = fragment.usage.is_some(),
            "LLM response received"
        );
        Ok(stream::iter(vec![Ok(fragment)]).boxed())
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        "OpenAI-compatible HTTP"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
