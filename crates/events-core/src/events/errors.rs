//! Error events
//!
//! A closed family: one variant per invocation context plus a generic one.
//! Listeners register on the key of the variant they care about and match on
//! [`ErrorEvent`] to reach the payload.

use std::any::Any;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::context::{
    AutocompleteContext, CommandContext, ComponentContext, ContextKind, InvocationContext,
    ModalContext,
};
use crate::failure::ListenerFailure;
use crate::{impl_event_name, Event, EventFamily, EventName};

/// What every error event carries: the failure and the call in flight
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub failure: ListenerFailure,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl ErrorDetails {
    #[must_use]
    pub fn new(failure: ListenerFailure) -> Self {
        Self {
            failure,
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        self.args = args;
        self.kwargs = kwargs;
        self
    }
}

/// The library encountered an error outside of a specific invocation.
#[derive(Debug)]
pub struct GenericError {
    pub details: ErrorDetails,
    /// Where the error came from
    pub source: String,
    /// The context, if one was active
    pub ctx: Option<InvocationContext>,
}

/// An error raised inside a command callback.
#[derive(Debug)]
pub struct CommandError {
    pub details: ErrorDetails,
    pub ctx: Arc<CommandContext>,
}

/// An error raised inside a component callback.
#[derive(Debug)]
pub struct ComponentError {
    pub details: ErrorDetails,
    pub ctx: Arc<ComponentContext>,
}

/// An error raised inside an autocomplete callback.
#[derive(Debug)]
pub struct AutocompleteError {
    pub details: ErrorDetails,
    pub ctx: Arc<AutocompleteContext>,
}

/// An error raised inside a modal callback.
#[derive(Debug)]
pub struct ModalError {
    pub details: ErrorDetails,
    pub ctx: Arc<ModalContext>,
}

impl_event_name!(GenericError, override = "Error");
impl_event_name!(CommandError);
impl_event_name!(ComponentError);
impl_event_name!(AutocompleteError);
impl_event_name!(ModalError);

/// Every error event the core dispatches
#[derive(Debug)]
pub enum ErrorEvent {
    Generic(GenericError),
    Command(CommandError),
    Component(ComponentError),
    Autocomplete(AutocompleteError),
    Modal(ModalError),
}

impl ErrorEvent {
    /// Classify a failure by the context that was active when it happened.
    ///
    /// Without a context the error is generic and labelled with `source`.
    #[must_use]
    pub fn classify(
        details: ErrorDetails,
        ctx: Option<InvocationContext>,
        source: impl Into<String>,
    ) -> Self {
        match ctx {
            None => Self::generic(details, source, None),
            Some(InvocationContext::Command(ctx)) => Self::Command(CommandError { details, ctx }),
            Some(InvocationContext::Component(ctx)) => {
                Self::Component(ComponentError { details, ctx })
            }
            Some(InvocationContext::Autocomplete(ctx)) => {
                Self::Autocomplete(AutocompleteError { details, ctx })
            }
            Some(InvocationContext::Modal(ctx)) => Self::Modal(ModalError { details, ctx }),
        }
    }

    /// Dispatch key of the variant classified under `kind`.
    #[must_use]
    pub fn key_for(kind: ContextKind) -> &'static str {
        match kind {
            ContextKind::None => GenericError::event_name(),
            ContextKind::Command => CommandError::event_name(),
            ContextKind::Component => ComponentError::event_name(),
            ContextKind::Autocomplete => AutocompleteError::event_name(),
            ContextKind::Modal => ModalError::event_name(),
        }
    }

    /// A generic error, optionally carrying the context that was active.
    #[must_use]
    pub fn generic(
        details: ErrorDetails,
        source: impl Into<String>,
        ctx: Option<InvocationContext>,
    ) -> Self {
        Self::Generic(GenericError {
            details,
            source: source.into(),
            ctx,
        })
    }

    #[must_use]
    pub fn details(&self) -> &ErrorDetails {
        match self {
            Self::Generic(e) => &e.details,
            Self::Command(e) => &e.details,
            Self::Component(e) => &e.details,
            Self::Autocomplete(e) => &e.details,
            Self::Modal(e) => &e.details,
        }
    }

    #[must_use]
    pub fn failure(&self) -> &ListenerFailure {
        &self.details().failure
    }

    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.details().args
    }

    #[must_use]
    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.details().kwargs
    }

    /// The context kind this error was classified under.
    #[must_use]
    pub fn kind(&self) -> ContextKind {
        match self {
            Self::Generic(_) => ContextKind::None,
            Self::Command(_) => ContextKind::Command,
            Self::Component(_) => ContextKind::Component,
            Self::Autocomplete(_) => ContextKind::Autocomplete,
            Self::Modal(_) => ContextKind::Modal,
        }
    }

    /// Source label of a generic error.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Generic(e) => Some(&e.source),
            _ => None,
        }
    }
}

impl Event for ErrorEvent {
    fn resolved_name(&self) -> &str {
        Self::key_for(self.kind())
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Generic(_) => GenericError::TYPE_NAME,
            Self::Command(_) => CommandError::TYPE_NAME,
            Self::Component(_) => ComponentError::TYPE_NAME,
            Self::Autocomplete(_) => AutocompleteError::TYPE_NAME,
            Self::Modal(_) => ModalError::TYPE_NAME,
        }
    }

    fn family(&self) -> EventFamily {
        EventFamily::Error
    }

    fn context(&self) -> Option<InvocationContext> {
        match self {
            Self::Generic(e) => e.ctx.clone(),
            Self::Command(e) => Some(InvocationContext::Command(Arc::clone(&e.ctx))),
            Self::Component(e) => Some(InvocationContext::Component(Arc::clone(&e.ctx))),
            Self::Autocomplete(e) => Some(InvocationContext::Autocomplete(Arc::clone(&e.ctx))),
            Self::Modal(e) => Some(InvocationContext::Modal(Arc::clone(&e.ctx))),
        }
    }

    fn is_terminal_error(&self) -> bool {
        matches!(self, Self::Generic(_))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
