//! Model backend layer for LocalChat.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`] — the single streaming chat capability the agent consumes
//! - [`http_provider::HttpProvider`] — OpenAI-compatible HTTP client for local servers
//! - [`sse`] — server-sent events decoding for streamed completions

pub mod http_provider;
pub mod sse;
pub mod traits;

// Re-export main types for convenience
pub use http_provider::HttpProvider;
pub use traits::{FragmentStream, LlmProvider, LlmRequestConfig};
