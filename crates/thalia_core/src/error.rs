//! Error taxonomy for the agent core.
//!
//! Transient I/O errors are retried locally and only surfaced after the
//! retry budget is exhausted. Generation-quality failures are absorbed by
//! the fallback path. Periodic sweep errors are logged and never halt the
//! sweep or the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Transient network failure. Retryable with bounded backoff.
    #[error("network error: {0}")]
    Network(String),

    /// Platform told us to slow down. Retryable after a fixed-then-jittered wait.
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Credentials rejected. Fatal; surfaced to the operator, never retried.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The specific operation cannot succeed with this payload (e.g. oversize
    /// content). Fatal for the operation only.
    #[error("data error: {0}")]
    Data(String),

    /// Generated output was rejected by post-hoc validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A consolidation sweep failed partway. Logged, sweep continues.
    #[error("consolidation error: {0}")]
    Consolidation(String),

    /// A decay sweep failed partway. Logged, sweep continues.
    #[error("decay error: {0}")]
    Decay(String),
}

impl AgentError {
    /// Whether a local bounded retry is appropriate for this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentError::Network(_) | AgentError::RateLimit(_))
    }

    /// Whether the error should stop the surrounding operation entirely.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AgentError::Auth(_) | AgentError::Data(_))
    }
}
