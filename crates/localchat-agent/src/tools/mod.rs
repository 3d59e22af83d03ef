//! Tool modules for the LocalChat agent.

pub mod base;
pub mod filesystem;
pub mod registry;

pub use base::{ParamSpec, ParamType, ToolError, ToolKind};
pub use registry::{ToolExecutor, ToolInvocation};
