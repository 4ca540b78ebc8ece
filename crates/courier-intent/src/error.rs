//! Intent engine error types.
//!
//! All intent subsystems surface errors through [`IntentError`].  Each variant
//! carries enough context for callers to decide how to handle the failure.

/// Unified error type for the intent engine.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    /// The resolution call failed or returned nothing usable.
    #[error("resolution failed: {reason}")]
    Resolution { reason: String },

    /// A required field is missing or unparseable after normalization.
    ///
    /// Always raised before any network call is made.
    #[error("invalid parameters for `{action}`: {reason}")]
    Validation { action: String, reason: String },

    /// The action name is outside the closed set of dispatchable actions.
    #[error("unsupported action `{action}`")]
    Unsupported { action: String },

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the intent crate.
pub type Result<T> = std::result::Result<T, IntentError>;
