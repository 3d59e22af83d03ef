//! LocalChat Core — shared types, configuration, and session persistence.
//!
//! This crate contains:
//! - **types**: conversation messages, tool calls, generation stats, wire format
//! - **config**: JSON config file + env var overrides
//! - **session**: versioned session documents on disk
//! - **utils**: data paths and string helpers

pub mod config;
pub mod session;
pub mod types;
pub mod utils;

pub use types::{ChatMessage, ChatRole, Fragment, GenerationStats, Message, Role, ToolCall, UsageInfo};
