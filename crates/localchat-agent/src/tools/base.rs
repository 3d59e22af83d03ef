//! Tool kinds, parameter tables, and tool errors.
//!
//! The tool set is fixed. Each [`ToolKind`] carries a declarative parameter
//! table; the same table validates incoming arguments and renders the
//! signature advertised to the model.

use std::fmt;
use std::io;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::sandbox::SandboxViolation;

// ─────────────────────────────────────────────
// Parameter tables
// ─────────────────────────────────────────────

/// Primitive JSON type of a tool parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    String,
}

impl ParamType {
    /// Whether `value` is of this type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One required parameter of a tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
}

const READ_FILE_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "path",
    kind: ParamType::String,
    description: "Path to the file to read (relative to workspace)",
}];

const WRITE_FILE_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "path",
        kind: ParamType::String,
        description: "Path to the file to write (relative to workspace)",
    },
    ParamSpec {
        name: "content",
        kind: ParamType::String,
        description: "Content to write to the file",
    },
];

/// Check `args` against a parameter table.
///
/// Every missing or mistyped field is reported, in table order, as
/// `"<field>: <problem>"` joined by `"; "`.
pub fn validate_params(params: &[ParamSpec], args: &Map<String, Value>) -> Result<(), String> {
    let problems: Vec<String> = params
        .iter()
        .filter_map(|spec| match args.get(spec.name) {
            None => Some(format!("{}: Field required", spec.name)),
            Some(value) if !spec.kind.matches(value) => Some(format!(
                "{}: Input should be a valid {}",
                spec.name, spec.kind
            )),
            Some(_) => None,
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}

// ─────────────────────────────────────────────
// ToolKind
// ─────────────────────────────────────────────

/// The tools the model may call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ReadFile,
    WriteFile,
}

impl ToolKind {
    /// Every tool, in advertisement order.
    pub const ALL: [ToolKind; 2] = [ToolKind::ReadFile, ToolKind::WriteFile];

    /// Name the model uses to call this tool.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ReadFile => "read_file",
            ToolKind::WriteFile => "write_file",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::ReadFile => "Read the contents of a file from the workspace directory",
            ToolKind::WriteFile => "Write content to a file in the workspace directory",
        }
    }

    pub fn params(self) -> &'static [ParamSpec] {
        match self {
            ToolKind::ReadFile => READ_FILE_PARAMS,
            ToolKind::WriteFile => WRITE_FILE_PARAMS,
        }
    }

    /// `read_file(path: string)`
    pub fn signature(self) -> String {
        let params: Vec<String> = self
            .params()
            .iter()
            .map(|p| format!("{}: {}", p.name, p.kind))
            .collect();
        format!("{}({})", self.name(), params.join(", "))
    }

    /// Validate an argument object against this tool's parameter table.
    pub fn validate(self, args: &Map<String, Value>) -> Result<(), ToolError> {
        validate_params(self.params(), args).map_err(|details| ToolError::Validation {
            tool: self.name(),
            details,
        })
    }

    /// Names of every tool.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.name()).collect()
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Every way a tool call can fail. The executor renders these as
/// `"Error: {self}"` for the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Sandbox(#[from] SandboxViolation),

    #[error("Invalid JSON arguments: {0}")]
    InvalidJson(String),

    #[error("Unknown tool '{name}'. Available tools: {available:?}")]
    UnknownTool {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("Invalid arguments for {tool}: {details}")]
    Validation { tool: &'static str, details: String },

    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Path is a directory, not a file: {path}")]
    IsDirectory { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Unexpected error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    /// Map an I/O failure on `path` to the matching variant.
    pub fn from_io(path: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => ToolError::NotFound {
                path: path.to_string(),
            },
            io::ErrorKind::PermissionDenied => ToolError::PermissionDenied {
                path: path.to_string(),
            },
            _ => ToolError::Io {
                path: path.to_string(),
                source,
            },
        }
    }
}
