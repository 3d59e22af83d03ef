//! Workspace path sandbox.
//!
//! Every path a tool touches goes through [`PathSandbox::resolve`]. The target
//! is canonicalized (symlinks and `..` resolved) and must equal or descend from
//! the canonical workspace root. Containment is component-wise, so
//! `/work/space-evil` is not inside `/work/space`.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// A path argument that resolves outside the workspace.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(
    "Access denied: '{path}' is outside the workspace directory. Only files within '{}' can be accessed.",
    .root.display()
)]
pub struct SandboxViolation {
    /// The path exactly as the model supplied it.
    pub path: String,
    /// The canonical workspace root.
    pub root: PathBuf,
}

// ─────────────────────────────────────────────
// PathSandbox
// ─────────────────────────────────────────────

/// A canonical workspace root, fixed for the lifetime of the sandbox.
#[derive(Clone, Debug)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    /// Create the workspace directory if needed and canonicalize it.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        debug!(root = %root.display(), "workspace sandbox ready");
        Ok(Self { root })
    }

    /// The canonical workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a model-supplied path to an absolute path inside the workspace.
    pub fn resolve(&self, user_path: &str) -> Result<PathBuf, SandboxViolation> {
        resolve_within(&self.root, user_path)
    }
}

/// Resolve `user_path` against `workspace_root` without a [`PathSandbox`].
///
/// The root is canonicalized on every call; a root that cannot be
/// canonicalized rejects everything.
pub fn resolve(workspace_root: &Path, user_path: &str) -> Result<PathBuf, SandboxViolation> {
    match workspace_root.canonicalize() {
        Ok(root) => resolve_within(&root, user_path),
        Err(e) => {
            warn!(root = %workspace_root.display(), error = %e, "workspace root not accessible");
            Err(SandboxViolation {
                path: user_path.to_string(),
                root: workspace_root.to_path_buf(),
            })
        }
    }
}

fn resolve_within(root: &Path, user_path: &str) -> Result<PathBuf, SandboxViolation> {
    let violation = || SandboxViolation {
        path: user_path.to_string(),
        root: root.to_path_buf(),
    };

    let candidate = if is_absolute_input(user_path) {
        let path = PathBuf::from(user_path);
        // A drive prefix is not absolute on this platform.
        if !path.is_absolute() {
            warn!(path = user_path, "rejected foreign absolute path");
            return Err(violation());
        }
        path
    } else {
        root.join(user_path.trim_start_matches(|c: char| c == '/' || c == '\\'))
    };

    let resolved = match canonicalize_lenient(&candidate) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(path = user_path, error = %e, "path could not be resolved");
            return Err(violation());
        }
    };

    if resolved.starts_with(root) {
        Ok(resolved)
    } else {
        warn!(path = user_path, resolved = %resolved.display(), "sandbox violation");
        Err(violation())
    }
}

/// `/…` or a drive prefix like `C:\` / `C:/`.
fn is_absolute_input(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Canonicalize a path that may not exist yet.
///
/// Components are applied one at a time to an already-canonical prefix.
/// Every component that exists is canonicalized on the spot, so a symlink is
/// followed wherever it appears, including after a `..` that backs out of a
/// missing directory. Components that do not exist are appended as-is. An
/// entry that exists but cannot be followed (a dangling symlink) is an error,
/// as is any failure other than "not found".
fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            // `resolved` is canonical up to its missing suffix, so popping
            // lands on the real parent.
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                let next = resolved.join(name);
                resolved = match std::fs::symlink_metadata(&next) {
                    Ok(_) => next.canonicalize()?,
                    Err(err) if err.kind() == io::ErrorKind::NotFound => next,
                    Err(err) => return Err(err),
                };
            }
        }
    }

    if resolved.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty path"));
    }
    Ok(resolved)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
