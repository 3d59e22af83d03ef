//! Conversation engine — the LLM ↔ tool-calling loop for one session.
//!
//! A user turn runs up to `max_iterations` generate/execute rounds. Each
//! generation is streamed through a [`StreamScanner`] so the observer only
//! ever sees prose, then parsed for fenced tool calls. A response without
//! tool calls ends the turn.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use futures_util::StreamExt;
use serde_json::Value;
use tracing::{debug, info, warn};

use localchat_core::types::{ChatMessage, GenerationStats, Message, ToolCall, UsageInfo};
use localchat_providers::traits::{LlmProvider, LlmRequestConfig};

use crate::context::ContextBuilder;
use crate::parser;
use crate::scanner::StreamScanner;
use crate::tools::ToolExecutor;

/// Default maximum generate/execute rounds per user turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Final reply when the round limit is reached.
pub const ITERATION_LIMIT_MESSAGE: &str =
    "I apologize, but I was unable to complete the request within the allowed number of steps.";

// ─────────────────────────────────────────────
// Observer
// ─────────────────────────────────────────────

/// Receives turn progress as it happens.
pub trait TurnObserver: Send {
    /// Prose that is safe to display, in stream order.
    fn on_text(&mut self, _text: &str) {}

    /// A tool call is about to run.
    fn on_tool_call(&mut self, _call: &ToolCall) {}

    /// A tool call finished with `result` (possibly an `"Error: ..."` string).
    fn on_tool_result(&mut self, _call: &ToolCall, _result: &str) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl TurnObserver for NoopObserver {}

/// Result of one user turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    /// The final assistant message content.
    pub reply: String,
    /// Usage and timing summed over every generation of the turn.
    pub stats: GenerationStats,
    /// Number of generations made.
    pub iterations: usize,
    /// Number of tool calls executed.
    pub tool_calls: usize,
    /// Whether the turn ended on the round limit.
    pub hit_iteration_limit: bool,
}

// ─────────────────────────────────────────────
// ConversationEngine
// ─────────────────────────────────────────────

/// Owns the history of one conversation and drives its tool-calling loop.
pub struct ConversationEngine {
    provider: Arc<dyn LlmProvider>,
    tools: ToolExecutor,
    context: ContextBuilder,
    request_config: LlmRequestConfig,
    max_iterations: usize,
    history: Vec<Message>,
}

impl ConversationEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: ToolExecutor, context: ContextBuilder) -> Self {
        info!(
            model = provider.model(),
            provider = provider.display_name(),
            workspace = %tools.workspace().display(),
            "conversation engine initialized"
        );
        Self {
            provider,
            tools,
            context,
            request_config: LlmRequestConfig::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            history: Vec::new(),
        }
    }

    pub fn with_request_config(mut self, request_config: LlmRequestConfig) -> Self {
        self.request_config = request_config;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Run one user turn to completion.
    ///
    /// The user message is appended before the first generation and stays in
    /// history if generation fails.
    pub async fn chat(&mut self, input: &str, observer: &mut dyn TurnObserver) -> Result<TurnOutcome> {
        self.history.push(Message::user(input));

        let mut stats = GenerationStats::default();
        let mut tool_calls = 0;

        for iteration in 1..=self.max_iterations {
            debug!(iteration, history = self.history.len(), "LLM call");

            let (text, generation) = self.generate(observer).await?;
            stats += &generation;

            let (calls, _) = parser::extract(&text);
            if calls.is_empty() {
                self.history.push(Message::assistant(text.clone()));
                info!(
                    iterations = iteration,
                    tool_calls,
                    completion_tokens = stats.completion_tokens,
                    "turn complete"
                );
                return Ok(TurnOutcome {
                    reply: text,
                    stats,
                    iterations: iteration,
                    tool_calls,
                    hit_iteration_limit: false,
                });
            }

            self.history
                .push(Message::assistant_with_tools(text, calls.clone()));

            for call in &calls {
                observer.on_tool_call(call);
                let result = self
                    .tools
                    .execute(&call.name, &Value::Object(call.arguments.clone()));
                debug!(tool = %call.name, result_len = result.len(), "tool result");
                observer.on_tool_result(call, &result);
                self.history.push(Message::tool_result(&call.name, result));
                tool_calls += 1;
            }
        }

        warn!(max_iterations = self.max_iterations, "tool iteration limit reached");
        self.history.push(Message::assistant(ITERATION_LIMIT_MESSAGE));
        Ok(TurnOutcome {
            reply: ITERATION_LIMIT_MESSAGE.to_string(),
            stats,
            iterations: self.max_iterations,
            tool_calls,
            hit_iteration_limit: true,
        })
    }

    /// One generation: stream, scan, and measure.
    async fn generate(&self, observer: &mut dyn TurnObserver) -> Result<(String, GenerationStats)> {
        let messages = self.context.build_messages(&self.history);
        let started = Instant::now();

        let mut stream = self
            .provider
            .chat_stream(&messages, &self.request_config)
            .await?;

        let mut scanner = StreamScanner::new();
        let mut usage: Option<UsageInfo> = None;

        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            if let Some(content) = fragment.content.as_deref() {
                let visible = scanner.push(content);
                if !visible.is_empty() {
                    observer.on_text(&visible);
                }
            }
            if fragment.usage.is_some() {
                usage = fragment.usage;
            }
        }
        let tail = scanner.finish();
        if !tail.is_empty() {
            observer.on_text(&tail);
        }

        let duration = started.elapsed().as_secs_f64();
        let text = scanner.into_text();
        let usage = usage.unwrap_or_else(|| {
            debug!("backend reported no usage, estimating");
            estimate_usage(&messages, &text)
        });

        Ok((text, GenerationStats::new(&usage, duration)))
    }

    // ────────────── History ──────────────

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// A copy of the full history, for persistence.
    pub fn export_history(&self) -> Vec<Message> {
        self.history.clone()
    }

    /// Replace the history wholesale (e.g. from a saved session).
    pub fn replace_history(&mut self, messages: Vec<Message>) {
        debug!(messages = messages.len(), "history replaced");
        self.history = messages;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ────────────── Accessors ──────────────

    pub fn tools(&self) -> &ToolExecutor {
        &self.tools
    }

    pub fn system_prompt(&self) -> &str {
        self.context.system_prompt()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn request_config(&self) -> &LlmRequestConfig {
        &self.request_config
    }
}

// ────────────── Usage estimation ──────────────

/// Rough token count: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Usage for a backend that reports none.
fn estimate_usage(prompt: &[ChatMessage], completion: &str) -> UsageInfo {
    let prompt_chars: String = prompt.iter().map(|m| m.content.as_str()).collect();
    let prompt_tokens = estimate_tokens(&prompt_chars);
    let completion_tokens = estimate_tokens(completion);
    UsageInfo {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens + completion_tokens,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
