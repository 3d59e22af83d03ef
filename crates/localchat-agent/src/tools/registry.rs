//! Tool executor — validates arguments and dispatches calls by name.
//!
//! The model always gets a `String` back: failures of any kind come out as
//! `"Error: ..."` text it can read and react to.

use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::base::{ToolError, ToolKind};
use super::filesystem::{read_file, write_file, ReadFileArgs, WriteFileArgs};
use crate::sandbox::PathSandbox;

// ─────────────────────────────────────────────
// ToolInvocation
// ─────────────────────────────────────────────

/// A validated call, carrying the typed arguments of its tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolInvocation {
    ReadFile(ReadFileArgs),
    WriteFile(WriteFileArgs),
}

impl ToolInvocation {
    /// Decode and validate a call.
    ///
    /// `arguments` may be an object or a string holding JSON. Checks run in
    /// order: JSON syntax, tool name, parameter table.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ToolError> {
        let parsed;
        let arguments = match arguments {
            Value::String(raw) => {
                parsed = serde_json::from_str::<Value>(raw)
                    .map_err(|e| ToolError::InvalidJson(e.to_string()))?;
                &parsed
            }
            other => other,
        };

        let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
            available: ToolKind::names(),
        })?;

        let Value::Object(map) = arguments else {
            return Err(ToolError::Validation {
                tool: kind.name(),
                details: "arguments: Input should be a valid object".to_string(),
            });
        };
        kind.validate(map)?;

        Ok(match kind {
            ToolKind::ReadFile => ToolInvocation::ReadFile(typed_args(kind, map)?),
            ToolKind::WriteFile => ToolInvocation::WriteFile(typed_args(kind, map)?),
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInvocation::ReadFile(_) => ToolKind::ReadFile,
            ToolInvocation::WriteFile(_) => ToolKind::WriteFile,
        }
    }

    pub fn run(&self, sandbox: &PathSandbox) -> Result<String, ToolError> {
        match self {
            ToolInvocation::ReadFile(args) => read_file(sandbox, args),
            ToolInvocation::WriteFile(args) => write_file(sandbox, args),
        }
    }
}

fn typed_args<T: DeserializeOwned>(kind: ToolKind, map: &Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(map.clone())).map_err(|e| ToolError::Validation {
        tool: kind.name(),
        details: e.to_string(),
    })
}

// ─────────────────────────────────────────────
// ToolExecutor
// ─────────────────────────────────────────────

/// Runs tool calls against a fixed workspace.
#[derive(Clone, Debug)]
pub struct ToolExecutor {
    sandbox: PathSandbox,
}

impl ToolExecutor {
    /// Create an executor rooted at `workspace`, creating the directory if absent.
    pub fn new(workspace: impl AsRef<Path>) -> io::Result<Self> {
        let sandbox = PathSandbox::new(workspace)?;
        info!(workspace = %sandbox.root().display(), tools = ToolKind::ALL.len(), "tool executor ready");
        Ok(Self { sandbox })
    }

    /// The canonical workspace root.
    pub fn workspace(&self) -> &Path {
        self.sandbox.root()
    }

    /// Tools this executor dispatches, in advertisement order.
    pub fn tools(&self) -> &'static [ToolKind] {
        &ToolKind::ALL
    }

    /// Execute a call, returning the typed error on failure.
    pub fn try_execute(&self, name: &str, arguments: &Value) -> Result<String, ToolError> {
        ToolInvocation::parse(name, arguments)?.run(&self.sandbox)
    }

    /// Execute a call. Never fails: errors become `"Error: ..."` strings.
    pub fn execute(&self, name: &str, arguments: &Value) -> String {
        info!(tool = name, "executing tool call");
        match self.try_execute(name, arguments) {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                format!("Error: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ToolExecutor) {
        let dir = TempDir::new().unwrap();
        let executor = ToolExecutor::new(dir.path().join("ws")).unwrap();
        (dir, executor)
    }

    #[test]
    fn test_new_creates_workspace() {
        let (dir, executor) = setup();
        assert!(dir.path().join("ws").is_dir());
        assert_eq!(executor.tools(), &[ToolKind::ReadFile, ToolKind::WriteFile]);
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, executor) = setup();
        let written = executor.execute(
            "write_file",
            &json!({"path": "notes.md", "content": "# Notes"}),
        );
        assert_eq!(written, "Successfully wrote 7 characters to notes.md");
        assert_eq!(executor.execute("read_file", &json!({"path": "notes.md"})), "# Notes");
    }

    #[test]
    fn test_string_arguments_are_parsed() {
        let (_dir, executor) = setup();
        let result = executor.execute("write_file", &json!(r#"{"path": "s.txt", "content": "ok"}"#));
        assert!(result.starts_with("Successfully wrote 2 characters"));
    }

    #[test]
    fn test_invalid_json_string() {
        let (_dir, executor) = setup();
        let result = executor.execute("read_file", &json!("{not json"));
        assert!(result.starts_with("Error: Invalid JSON arguments:"));
    }

    #[test]
    fn test_unknown_tool() {
        let (_dir, executor) = setup();
        let result = executor.execute("delete_file", &json!({"path": "a"}));
        assert_eq!(
            result,
            "Error: Unknown tool 'delete_file'. Available tools: [\"read_file\", \"write_file\"]"
        );
    }

    #[test]
    fn test_missing_and_mistyped_fields_named() {
        let (_dir, executor) = setup();
        let result = executor.execute("write_file", &json!({"path": 7}));
        assert!(result.starts_with("Error: Invalid arguments for write_file:"));
        assert!(result.contains("path: Input should be a valid string"));
        assert!(result.contains("content: Field required"));
    }

    #[test]
    fn test_non_object_arguments() {
        let (_dir, executor) = setup();
        let result = executor.execute("read_file", &json!(["a.txt"]));
        assert!(result.contains("arguments: Input should be a valid object"));
    }

    #[test]
    fn test_escape_attempts_report_outside_workspace() {
        let (_dir, executor) = setup();
        for path in ["../secret.txt", "foo/../../secret.txt", "/etc/passwd"] {
            let result = executor.execute("read_file", &json!({"path": path}));
            assert!(result.starts_with("Error: Access denied"), "{path}: {result}");
            assert!(result.contains("outside the workspace"), "{path}: {result}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_behind_missing_dir_cannot_escape() {
        let (dir, executor) = setup();
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("secret.txt"), "s3cret").unwrap();
        std::os::unix::fs::symlink("../outside", executor.workspace().join("link")).unwrap();

        let read = executor.execute("read_file", &json!({"path": "missing/../link/secret.txt"}));
        assert!(read.starts_with("Error: Access denied"), "{read}");

        let write = executor.execute(
            "write_file",
            &json!({"path": "nope/../link/pwned.txt", "content": "x"}),
        );
        assert!(write.starts_with("Error: Access denied"), "{write}");
        assert!(!outside.join("pwned.txt").exists());
    }

    #[test]
    fn test_missing_file_is_error_string() {
        let (_dir, executor) = setup();
        assert_eq!(
            executor.execute("read_file", &json!({"path": "missing.txt"})),
            "Error: File not found: missing.txt"
        );
    }

    #[test]
    fn test_parse_typed_invocation() {
        let invocation =
            ToolInvocation::parse("read_file", &json!({"path": "a.txt", "extra": 1})).unwrap();
        assert_eq!(
            invocation,
            ToolInvocation::ReadFile(ReadFileArgs { path: "a.txt".into() })
        );
        assert_eq!(invocation.kind(), ToolKind::ReadFile);
    }

    #[test]
    fn test_try_execute_returns_typed_error() {
        let (_dir, executor) = setup();
        let err = executor
            .try_execute("read_file", &json!({"path": "../x"}))
            .unwrap_err();
        assert!(matches!(err, ToolError::Sandbox(_)));
    }
}
