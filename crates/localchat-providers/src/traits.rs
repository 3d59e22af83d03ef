//! LLM Provider trait — the narrow "generate a chat completion" capability the
//! agent loop consumes.
//!
//! Every backend returns a lazy stream of [`Fragment`]s. Backends that cannot
//! stream return a one-element stream, so callers have a single consumption path.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use localchat_core::types::{ChatMessage, Fragment};

/// A pull-based sequence of generated fragments.
pub type FragmentStream = BoxStream<'static, anyhow::Result<Fragment>>;

/// Configuration passed to each LLM call.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.7,
        }
    }
}

/// Trait that all model backends implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Start a chat completion.
    ///
    /// # Arguments
    /// * `messages` — System prompt followed by the projected history.
    /// * `config`   — Temperature, max_tokens.
    ///
    /// # Returns
    /// A stream of fragments, each carrying partial content and/or a usage
    /// summary. Transport and API failures are returned as `Err`, either
    /// up front or as a stream item; the caller decides whether to retry.
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        config: &LlmRequestConfig,
    ) -> anyhow::Result<FragmentStream>;

    /// The model identifier this provider sends.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
