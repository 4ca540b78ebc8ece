//! Adapter error types.
//!
//! All integration adapters surface errors through [`AdapterError`].  Errors
//! never cross the dispatch boundary as faults — the dispatcher catches them
//! and returns them as structured data.

/// Unified error type for courier adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The adapter requires a credential that was never configured.
    #[error("authentication required for adapter `{adapter}`: {detail}")]
    AuthRequired { adapter: String, detail: String },

    /// No endpoint URL is configured for this adapter (or app).
    #[error("no endpoint configured for adapter `{adapter}`: {detail}")]
    MissingEndpoint { adapter: String, detail: String },

    /// A required call parameter is absent and no default applies.
    #[error("missing parameter `{field}` for adapter `{adapter}`")]
    MissingParameter { adapter: String, field: String },

    /// The outbound HTTP request failed (network error, timeout, non-2xx).
    #[error("request failed for adapter `{adapter}`: {reason}")]
    RequestFailed { adapter: String, reason: String },

    /// The integration responded, but with an error envelope or an
    /// uninterpretable body.
    #[error("invalid response from adapter `{adapter}`: {reason}")]
    InvalidResponse { adapter: String, reason: String },
}

/// Convenience alias used throughout the dispatch crate.
pub type Result<T> = std::result::Result<T, AdapterError>;
