//! Context builder — constructs the system prompt and the model message list.
//!
//! The system prompt advertises each tool's signature and the fenced
//! `tool_call` syntax. Local chat templates have no tool role, so tool
//! results are replayed to the model as user messages.

use localchat_core::types::{ChatMessage, Message};

use crate::scanner::TOOL_CALL_OPEN;
use crate::tools::ToolKind;

// ─────────────────────────────────────────────
// Context builder
// ─────────────────────────────────────────────

/// Holds the system prompt and projects history into model messages.
#[derive(Clone, Debug)]
pub struct ContextBuilder {
    system_prompt: String,
}

impl ContextBuilder {
    /// Build the context, appending `user_prompt` after the tool instructions.
    pub fn new(user_prompt: Option<&str>) -> Self {
        Self {
            system_prompt: build_system_prompt(user_prompt),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// System prompt first, then every history message in order.
    pub fn build_messages(&self, history: &[Message]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(&self.system_prompt));
        messages.extend(history.iter().map(project));
        messages
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Map one history message to the role/content pair the model sees.
fn project(message: &Message) -> ChatMessage {
    match message {
        Message::User { content } => ChatMessage::user(content),
        Message::Assistant { content, .. } => ChatMessage::assistant(content),
        Message::Tool {
            content,
            tool_call_id,
        } => ChatMessage::user(format!("Tool result for {tool_call_id}:\n{content}")),
    }
}

// ────────────── System prompt ──────────────

/// The tool-use instructions, followed by the user's own prompt if any.
pub fn build_system_prompt(user_prompt: Option<&str>) -> String {
    let tools: Vec<String> = ToolKind::ALL
        .iter()
        .map(|kind| format!("- {}: {}", kind.signature(), kind.description()))
        .collect();

    let base = format!(
        "You are a helpful assistant with access to the following tools:\n\
         \n\
         {tools}\n\
         \n\
         To use a tool, respond with a JSON object in this exact format:\n\
         {open}\n\
         {{\"name\": \"tool_name\", \"arguments\": {{\"param1\": \"value1\", \"param2\": \"value2\"}}}}\n\
         ```\n\
         \n\
         You can make multiple tool calls by including multiple tool_call blocks.\n\
         After receiving tool results, provide your final response to the user.\n\
         Only use tools when necessary to complete the user's request.",
        tools = tools.join("\n"),
        open = TOOL_CALL_OPEN,
    );

    match user_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        Some(extra) => format!("{base}\n\n{extra}"),
        None => base,
    }
}
