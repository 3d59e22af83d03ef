//! LocalChat Agent — sandboxed tools, stream scanning, and the tool-calling loop.
//!
//! This crate contains:
//! - **sandbox**: workspace path resolution and containment
//! - **tools**: tool kinds, argument validation, and the executor
//! - **scanner**: tool-call marker detection in a live token stream
//! - **parser**: tool-call extraction from a complete response
//! - **context**: system prompt and model message construction
//! - **engine**: the LLM ↔ tool-calling conversation loop

pub mod context;
pub mod engine;
pub mod parser;
pub mod sandbox;
pub mod scanner;
pub mod tools;

pub use context::ContextBuilder;
pub use engine::{ConversationEngine, NoopObserver, TurnObserver, TurnOutcome};
pub use sandbox::{PathSandbox, SandboxViolation};
pub use scanner::StreamScanner;
pub use tools::{ToolError, ToolExecutor, ToolKind};
