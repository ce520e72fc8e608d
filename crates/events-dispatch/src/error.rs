//! Dispatcher errors
//!
//! Listener failures are never returned from here; they become error events.
//! These cover the dispatcher's own operations only.

use std::time::Duration;

/// Errors returned by dispatcher operations
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no tokio runtime is available to run listeners on")]
    NoRuntime,

    #[error("dispatcher has been shut down")]
    ShutDown,

    #[error("timed out after {timeout:?} waiting for `{key}`")]
    WaitTimeout { key: String, timeout: Duration },

    #[error("{pending} listener invocation(s) still running after drain timeout")]
    DrainTimeout { pending: usize },

    #[error("expected a `{expected}` event, got `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid gateway payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl DispatchError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. } | Self::DrainTimeout { .. })
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
