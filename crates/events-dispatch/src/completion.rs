//! Completion events and the invocation boundary

use std::future::Future;
use std::panic::AssertUnwindSafe;

use events_core::{completion_event, InvocationContext, ListenerFailure};
use futures::FutureExt;
use serde_json::{Map, Value};

use crate::dispatcher::Dispatcher;

/// Emits completion events after successful invocations
pub struct CompletionEmitter<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> CompletionEmitter<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Dispatch the completion event matching `ctx`.
    ///
    /// Only call this after the callback returned successfully.
    pub fn emit(&self, ctx: impl Into<InvocationContext>) {
        let ctx = ctx.into();
        tracing::trace!(context = %ctx, "Invocation completed");
        self.dispatcher.dispatch_arc(completion_event(ctx));
    }
}

/// How an application callback ended
#[derive(Debug, Clone)]
pub enum InvocationOutcome {
    Completed,
    /// The callback failed; the matching error event has been dispatched
    Failed(ListenerFailure),
}

impl InvocationOutcome {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    #[must_use]
    pub fn failure(&self) -> Option<&ListenerFailure> {
        match self {
            Self::Completed => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Runs application callbacks and reports how they ended.
///
/// Success emits exactly one completion event. An error or panic emits
/// exactly one error event for the callback's context and no completion.
pub struct Invoker<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> Invoker<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub async fn run<F>(
        &self,
        ctx: impl Into<InvocationContext>,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
        callback: F,
    ) -> InvocationOutcome
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        let ctx = ctx.into();

        let failure = match AssertUnwindSafe(callback).catch_unwind().await {
            Ok(Ok(())) => {
                self.dispatcher.completions().emit(ctx);
                return InvocationOutcome::Completed;
            }
            Ok(Err(error)) => ListenerFailure::new(error),
            Err(panic) => ListenerFailure::from_panic(panic),
        };

        let source = ctx.label();
        tracing::debug!(context = %ctx, error = %failure, "Invocation failed");

        self.dispatcher
            .reclassifier()
            .report(failure.clone(), Some(ctx), args, kwargs, source);

        InvocationOutcome::Failed(failure)
    }
}
