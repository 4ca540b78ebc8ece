//! LLM client for courier.
//!
//! A thin, provider-agnostic client used by the intent resolver to run one
//! function-calling round trip per request.  Supports the Anthropic Messages
//! API and OpenAI-compatible Chat Completions endpoints.

pub mod client;
pub mod error;
pub mod types;

pub use client::{LlmClient, LlmClientConfig, LlmProvider};
pub use error::{LlmError, Result};
pub use types::{ChatRequest, LlmResponse, Message, Role, ToolCall, ToolDefinition};
