//! Captured listener and callback failures

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A failure captured from listener or callback code.
///
/// Cloning shares the same underlying error, so the failure that reaches an
/// error listener is the very one that was raised.
#[derive(Clone)]
pub struct ListenerFailure(Arc<anyhow::Error>);

impl ListenerFailure {
    #[must_use]
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    /// Build a failure from a caught panic payload.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self::new(ListenerPanic { message }.into())
    }

    #[must_use]
    pub fn error(&self) -> &anyhow::Error {
        &self.0
    }

    /// Whether both values hold the same captured error.
    #[must_use]
    pub fn same_failure(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn is_panic(&self) -> bool {
        self.0.is::<ListenerPanic>()
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }
}

impl From<anyhow::Error> for ListenerFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListenerFailure").field(&self.0).finish()
    }
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

/// A listener or callback panicked instead of returning an error
#[derive(Debug, thiserror::Error)]
#[error("listener panicked: {message}")]
pub struct ListenerPanic {
    pub message: String,
}
