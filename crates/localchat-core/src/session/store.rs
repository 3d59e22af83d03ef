//! Session persistence — one versioned JSON document per session file.
//!
//! File format:
//! ```json
//! {
//!   "version": 1,
//!   "timestamp": "2025-01-01T12:00:00Z",
//!   "messages": [{"role": "user", "content": "hello"}, ...]
//! }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::Message;

/// Current on-disk format version.
pub const SESSION_FORMAT_VERSION: u32 = 1;

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Failure to load or save a session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed session file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported session format version {found} in {} (expected {expected})", path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

// ─────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────

/// A persisted conversation: format version, save time, ordered history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionDocument {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl SessionDocument {
    /// Snapshot a history at the current time.
    pub fn new(messages: Vec<Message>) -> Self {
        SessionDocument {
            version: SESSION_FORMAT_VERSION,
            timestamp: Utc::now(),
            messages,
        }
    }
}

/// Write `messages` to `path`, creating parent directories as needed.
pub fn save_session(path: &Path, messages: &[Message]) -> Result<(), SessionError> {
    let io_err = |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let doc = SessionDocument::new(messages.to_vec());
    let json = serde_json::to_string_pretty(&doc).map_err(|source| SessionError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(io_err)?;

    debug!(
        path = %path.display(),
        messages = messages.len(),
        "session saved"
    );
    Ok(())
}

/// Read a session document from `path`.
pub fn load_session(path: &Path) -> Result<SessionDocument, SessionError> {
    let content = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let doc: SessionDocument =
        serde_json::from_str(&content).map_err(|source| SessionError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    if doc.version != SESSION_FORMAT_VERSION {
        return Err(SessionError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: doc.version,
            expected: SESSION_FORMAT_VERSION,
        });
    }

    debug!(
        path = %path.display(),
        messages = doc.messages.len(),
        "session loaded"
    );
    Ok(doc)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_history() -> Vec<Message> {
        let args = json!({"path": "notes/todo.txt", "content": "buy milk"});
        vec![
            Message::user("Save my todo"),
            Message::assistant_with_tools(
                "Saving it now.",
                vec![ToolCall::new("write_file", args.as_object().cloned().unwrap())],
            ),
            Message::tool_result("write_file", "Successfully wrote 8 characters to notes/todo.txt"),
            Message::assistant("Done."),
        ]
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions").join("chat.json");

        let history = sample_history();
        save_session(&path, &history).unwrap();

        let doc = load_session(&path).unwrap();
        assert_eq!(doc.version, SESSION_FORMAT_VERSION);
        assert_eq!(doc.messages, history);
    }

    #[test]
    fn test_session_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.json");
        save_session(&path, &sample_history()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert!(raw["timestamp"].is_string());

        let messages = raw["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        // Empty/absent fields are omitted
        assert!(messages[0].get("tool_calls").is_none());
        assert!(messages[0].get("tool_call_id").is_none());
        assert!(messages[1].get("tool_call_id").is_none());
        assert_eq!(messages[2]["tool_call_id"], "write_file");
        assert!(messages[3].get("tool_calls").is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_session(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SessionError::Io { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_session(&path).unwrap_err();
        assert!(matches!(err, SessionError::Malformed { .. }));
    }

    #[test]
    fn test_load_unsupported_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.json");
        std::fs::write(
            &path,
            r#"{"version": 99, "timestamp": "2025-01-01T00:00:00Z", "messages": []}"#,
        )
        .unwrap();

        let err = load_session(&path).unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedVersion { found: 99, .. }));
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_save_empty_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        save_session(&path, &[]).unwrap();
        assert!(load_session(&path).unwrap().messages.is_empty());
    }
}
