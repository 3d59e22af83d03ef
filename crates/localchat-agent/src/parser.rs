//! Tool-call extraction from a complete model response.
//!
//! The model requests tools with fenced blocks:
//!
//! ````text
//! ```tool_call
//! {"name": "read_file", "arguments": {"path": "notes.txt"}}
//! ```
//! ````
//!
//! Malformed blocks are dropped without error; the model sees no result for
//! them and usually retries.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use localchat_core::types::ToolCall;

fn tool_call_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```tool_call\s*\n?(.*?)\n?```").expect("tool_call pattern is valid")
    })
}

/// Split a response into its tool calls and the prose around them.
///
/// Calls keep their order of appearance. Every matched block is removed
/// from the remaining text, valid or not, and the remainder is trimmed.
pub fn extract(response: &str) -> (Vec<ToolCall>, String) {
    let re = tool_call_block();

    let calls: Vec<ToolCall> = re
        .captures_iter(response)
        .filter_map(|caps| caps.get(1).and_then(|m| decode_call(m.as_str())))
        .collect();

    let remaining = re.replace_all(response, "").trim().to_string();
    debug!(calls = calls.len(), "parsed response");
    (calls, remaining)
}

/// Decode one block body. `None` if it is not a usable call.
fn decode_call(body: &str) -> Option<ToolCall> {
    let value: Value = match serde_json::from_str(body.trim()) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "dropping malformed tool_call block");
            return None;
        }
    };

    let name = value.get("name")?.as_str()?.to_string();
    let arguments = match value.get("arguments")? {
        Value::Object(map) => map.clone(),
        // Some models double-encode the argument object.
        Value::String(raw) => serde_json::from_str::<Map<String, Value>>(raw).ok()?,
        _ => return None,
    };
    Some(ToolCall::new(name, arguments))
}
