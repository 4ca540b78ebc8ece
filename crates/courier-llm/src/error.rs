//! LLM client error types.
//!
//! All client operations surface errors through [`LlmError`].  Each variant
//! carries enough context for callers to decide how to handle the failure
//! without inspecting opaque strings.

/// Unified error type for the courier LLM client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No API key was configured for the selected provider.
    #[error("missing API key for provider `{provider}`")]
    MissingApiKey { provider: String },

    /// The HTTP request to the provider failed (network, non-2xx status).
    #[error("LLM request failed: {reason}")]
    RequestFailed { reason: String },

    /// The provider responded, but the body could not be interpreted.
    #[error("failed to parse LLM response: {reason}")]
    ParseFailed { reason: String },
}

/// Convenience alias used throughout the LLM crate.
pub type Result<T> = std::result::Result<T, LlmError>;
