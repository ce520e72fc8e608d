//! Error reclassification
//!
//! Turns captured failures into typed error events and feeds them back into
//! the dispatcher. A failure inside a listener for the generic `error` event
//! is a double fault: it goes to the [`FaultReporter`] and stops there, so
//! error handling can never recurse without bound.

use std::sync::Arc;

use events_core::{
    ErrorDetails, ErrorEvent, Event, EventFamily, InvocationContext, ListenerFailure,
};
use serde_json::{Map, Value};

use crate::dispatcher::Dispatcher;
use crate::registry::RegisteredListener;

/// Side channel for failures that cannot become events
pub trait FaultReporter: Send + Sync {
    fn report(&self, source: &str, failure: &ListenerFailure);
}

/// Logs faults with `tracing::error!`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFaultReporter;

impl FaultReporter for TracingFaultReporter {
    fn report(&self, source: &str, failure: &ListenerFailure) {
        tracing::error!(
            source = %source,
            error = %failure,
            panic = failure.is_panic(),
            "Unhandled listener failure"
        );
    }
}

/// Builds and dispatches error events for one dispatcher
pub struct ErrorReclassifier<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> ErrorReclassifier<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Report a failure raised by an application callback.
    ///
    /// The error event variant follows `ctx`: a command context yields
    /// `command_error`, no context yields the generic `error` labelled with
    /// `source`, and so on.
    pub fn report(
        &self,
        failure: ListenerFailure,
        ctx: Option<InvocationContext>,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
        source: impl Into<String>,
    ) {
        let source = source.into();
        let details = ErrorDetails::new(failure).with_args(args, kwargs);
        let event = ErrorEvent::classify(details, ctx, source.as_str());
        self.dispatch_error(event, &source);
    }

    /// Handle a listener that failed while processing `event`.
    pub(crate) fn listener_failed(
        &self,
        entry: &RegisteredListener,
        event: &Arc<dyn Event>,
        failure: ListenerFailure,
    ) {
        let source = format!("listener `{}` for `{}`", entry.name(), event.resolved_name());

        if event.is_terminal_error() {
            self.dispatcher.fault_reporter().report(&source, &failure);
            return;
        }

        tracing::warn!(
            source = %source,
            error = %failure,
            panic = failure.is_panic(),
            "Listener failed"
        );

        let details = ErrorDetails::new(failure);
        let error = if event.family() == EventFamily::Error {
            // Context-specific error listeners fall back to the generic event once
            ErrorEvent::generic(details, source.as_str(), event.context())
        } else {
            ErrorEvent::classify(details, event.context(), source.as_str())
        };
        self.dispatch_error(error, &source);
    }

    fn dispatch_error(&self, error: ErrorEvent, source: &str) {
        let failure = error.failure().clone();
        let name = error.resolved_name().to_string();

        let scheduled = self.dispatcher.dispatch(error);
        if scheduled == 0 {
            // Nobody is listening; keep the failure from vanishing
            tracing::debug!(event = %name, "No listeners for error event");
            self.dispatcher.fault_reporter().report(source, &failure);
        }
    }
}
