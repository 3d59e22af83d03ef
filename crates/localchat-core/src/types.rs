//! Core types for LocalChat — conversation history, tool calls, generation stats,
//! and the OpenAI-compatible wire format spoken to local model servers.
//!
//! History messages are a role-tagged enum so that the role/field coupling
//! (only assistant messages carry tool calls, only tool messages carry a
//! `tool_call_id`) is checked by the compiler instead of at runtime.

use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────
// Conversation history
// ─────────────────────────────────────────────

/// A message in the conversation history.
///
/// Serialized with a `role` tag. Empty `tool_calls` are omitted on the wire,
/// which is also the persisted session shape.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "user")]
    User { content: String },

    #[serde(rename = "assistant")]
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },

    /// Result of one tool invocation. `tool_call_id` holds the name of the
    /// tool that produced it.
    #[serde(rename = "tool")]
    Tool {
        content: String,
        tool_call_id: String,
    },
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    /// Create a plain assistant message (no tool calls).
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create an assistant message that triggered tool calls.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::Tool { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::User { content }
            | Message::Assistant { content, .. }
            | Message::Tool { content, .. } => content,
        }
    }

    /// Tool calls attached to this message (empty for non-assistant roles).
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Message::Tool { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }
}

/// Role of a history message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        })
    }
}

// ─────────────────────────────────────────────
// Tool calls
// ─────────────────────────────────────────────

/// A tool invocation requested by the model inside a fenced block.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Name of the tool to run (e.g. `"read_file"`).
    pub name: String,
    /// Argument object, shape defined per tool.
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        ToolCall {
            name: name.into(),
            arguments,
        }
    }

    /// Arguments rendered as compact JSON (for logs and console echo).
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

// ─────────────────────────────────────────────
// Generation statistics
// ─────────────────────────────────────────────

/// Token usage and timing for one or more generation calls.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationStats {
    pub total_tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub duration_seconds: f64,
}

impl GenerationStats {
    pub fn new(usage: &UsageInfo, duration_seconds: f64) -> Self {
        GenerationStats {
            total_tokens: usage.total_tokens,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            duration_seconds: duration_seconds.max(0.0),
        }
    }

    /// Completion throughput. Zero when no time was measured.
    pub fn tokens_per_second(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            self.completion_tokens as f64 / self.duration_seconds
        } else {
            0.0
        }
    }
}

impl AddAssign<&GenerationStats> for GenerationStats {
    fn add_assign(&mut self, other: &GenerationStats) {
        self.total_tokens += other.total_tokens;
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.duration_seconds += other.duration_seconds;
    }
}

// ─────────────────────────────────────────────
// Model-facing messages
// ─────────────────────────────────────────────

/// Role of a message sent to the model. The target chat templates have no
/// native tool role, so tool results are re-framed as user messages.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A role/content pair in the model prompt.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Token usage statistics reported by the backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UsageInfo {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// One incremental piece of a generated response.
///
/// A non-streaming backend yields exactly one fragment carrying the whole
/// text and the usage summary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fragment {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
}

impl Fragment {
    pub fn text(content: impl Into<String>) -> Self {
        Fragment {
            content: Some(content.into()),
            usage: None,
        }
    }

    pub fn usage(usage: UsageInfo) -> Self {
        Fragment {
            content: None,
            usage: Some(usage),
        }
    }
}

// ─────────────────────────────────────────────
// OpenAI-compatible wire format
// ─────────────────────────────────────────────

/// Request body for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

/// Asks streaming servers to append a usage summary chunk.
#[derive(Debug, Serialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

/// Non-streaming completion response.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl From<ChatCompletionResponse> for Fragment {
    fn from(resp: ChatCompletionResponse) -> Self {
        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        Fragment {
            content,
            usage: resp.usage,
        }
    }
}

/// One server-sent event payload of a streaming completion.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    pub usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    pub content: Option<String>,
}

impl From<ChatCompletionChunk> for Fragment {
    fn from(chunk: ChatCompletionChunk) -> Self {
        let content = chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|c| !c.is_empty());
        Fragment {
            content,
            usage: chunk.usage,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    // ── History messages ──

    #[test]
    fn test_user_message_serialization() {
        let json = serde_json::to_value(Message::user("hello")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_assistant_without_tools_omits_tool_calls() {
        let json = serde_json::to_value(Message::assistant("done")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());
    }

    #[test]
    fn test_assistant_with_tools_serialization() {
        let call = ToolCall::new("read_file", args(json!({"path": "a.txt"})));
        let json = serde_json::to_value(Message::assistant_with_tools("checking", vec![call])).unwrap();

        let calls = json["tool_calls"].as_array().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["name"], "read_file");
        assert_eq!(calls[0]["arguments"]["path"], "a.txt");
    }

    #[test]
    fn test_tool_result_serialization() {
        let json = serde_json::to_value(Message::tool_result("read_file", "contents")).unwrap();
        assert_eq!(
            json,
            json!({"role": "tool", "content": "contents", "tool_call_id": "read_file"})
        );
    }

    #[test]
    fn test_assistant_deserializes_without_tool_calls_field() {
        let msg: Message =
            serde_json::from_value(json!({"role": "assistant", "content": "hi"})).unwrap();
        assert_eq!(msg, Message::assistant("hi"));
        assert!(msg.tool_calls().is_empty());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result: Result<Message, _> =
            serde_json::from_value(json!({"role": "system", "content": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_accessors() {
        let tool = Message::tool_result("write_file", "ok");
        assert_eq!(tool.role(), Role::Tool);
        assert_eq!(tool.content(), "ok");
        assert_eq!(tool.tool_call_id(), Some("write_file"));
        assert!(tool.tool_calls().is_empty());

        let user = Message::user("q");
        assert_eq!(user.role().to_string(), "user");
        assert_eq!(user.tool_call_id(), None);
    }

    #[test]
    fn test_history_round_trip() {
        let history = vec![
            Message::user("Read test.txt"),
            Message::assistant_with_tools(
                "Let me check.",
                vec![ToolCall::new("read_file", args(json!({"path": "test.txt"})))],
            ),
            Message::tool_result("read_file", "hello"),
            Message::assistant("It says hello."),
        ];

        let text = serde_json::to_string(&history).unwrap();
        let restored: Vec<Message> = serde_json::from_str(&text).unwrap();
        assert_eq!(history, restored);
    }

    // ── Generation stats ──

    #[test]
    fn test_tokens_per_second_zero_duration() {
        let stats = GenerationStats {
            completion_tokens: 50,
            duration_seconds: 0.0,
            ..Default::default()
        };
        assert_eq!(stats.tokens_per_second(), 0.0);
    }

    #[test]
    fn test_tokens_per_second() {
        let stats = GenerationStats {
            completion_tokens: 50,
            duration_seconds: 2.0,
            ..Default::default()
        };
        assert_eq!(stats.tokens_per_second(), 25.0);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut total = GenerationStats::default();
        let usage = UsageInfo {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        total += &GenerationStats::new(&usage, 0.5);
        total += &GenerationStats::new(&usage, 1.5);

        assert_eq!(total.prompt_tokens, 20);
        assert_eq!(total.completion_tokens, 10);
        assert_eq!(total.total_tokens, 30);
        assert_eq!(total.duration_seconds, 2.0);
    }

    // ── Wire format ──

    #[test]
    fn test_chat_message_roles_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("be brief")).unwrap();
        assert_eq!(json, json!({"role": "system", "content": "be brief"}));
    }

    #[test]
    fn test_request_omits_stream_options_when_none() {
        let request = ChatCompletionRequest {
            model: "gemma".into(),
            messages: vec![ChatMessage::user("hi")],
            max_tokens: 2048,
            temperature: 0.7,
            stream: false,
            stream_options: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json.get("stream_options").is_none());
    }

    #[test]
    fn test_completion_response_into_fragment() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"message": {"role": "assistant", "content": "Hi!"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        }))
        .unwrap();
        let fragment: Fragment = resp.into();
        assert_eq!(fragment.content.as_deref(), Some("Hi!"));
        assert_eq!(fragment.usage.unwrap().total_tokens, 5);
    }

    #[test]
    fn test_completion_response_without_choices() {
        let resp: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [], "usage": null})).unwrap();
        let fragment: Fragment = resp.into();
        assert_eq!(fragment, Fragment::default());
    }

    #[test]
    fn test_chunk_into_fragment() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{"index": 0, "delta": {"content": "Hel"}, "finish_reason": null}]
        }))
        .unwrap();
        let fragment: Fragment = chunk.into();
        assert_eq!(fragment, Fragment::text("Hel"));
    }

    #[test]
    fn test_usage_only_chunk() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [],
            "usage": {"prompt_tokens": 7, "completion_tokens": 4, "total_tokens": 11}
        }))
        .unwrap();
        let fragment: Fragment = chunk.into();
        assert!(fragment.content.is_none());
        assert_eq!(fragment.usage.unwrap().completion_tokens, 4);
    }
}
