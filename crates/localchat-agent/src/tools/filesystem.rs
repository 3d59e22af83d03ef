//! Filesystem tools — read and write files inside the workspace.
//!
//! Both tools resolve their path through the [`PathSandbox`] before touching
//! the disk. Error messages quote the path as the model wrote it.

use serde::Deserialize;
use tracing::debug;

use super::base::ToolError;
use crate::sandbox::PathSandbox;

// ─────────────────────────────────────────────
// read_file
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ReadFileArgs {
    pub path: String,
}

/// Return the full text content of a workspace file.
pub fn read_file(sandbox: &PathSandbox, args: &ReadFileArgs) -> Result<String, ToolError> {
    let target = sandbox.resolve(&args.path)?;

    if !target.exists() {
        return Err(ToolError::NotFound {
            path: args.path.clone(),
        });
    }
    if target.is_dir() {
        return Err(ToolError::IsDirectory {
            path: args.path.clone(),
        });
    }

    let content =
        std::fs::read_to_string(&target).map_err(|e| ToolError::from_io(&args.path, e))?;
    debug!(path = %target.display(), bytes = content.len(), "read file");
    Ok(content)
}

// ─────────────────────────────────────────────
// write_file
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct WriteFileArgs {
    pub path: String,
    pub content: String,
}

/// Create or overwrite a workspace file, creating parent directories.
pub fn write_file(sandbox: &PathSandbox, args: &WriteFileArgs) -> Result<String, ToolError> {
    let target = sandbox.resolve(&args.path)?;

    if target.is_dir() {
        return Err(ToolError::IsDirectory {
            path: args.path.clone(),
        });
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ToolError::from_io(&args.path, e))?;
    }
    std::fs::write(&target, &args.content).map_err(|e| ToolError::from_io(&args.path, e))?;

    let chars = args.content.chars().count();
    debug!(path = %target.display(), chars, "wrote file");
    Ok(format!("Successfully wrote {chars} characters to {}", args.path))
}
