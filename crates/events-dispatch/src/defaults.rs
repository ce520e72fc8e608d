//! Built-in listeners
//!
//! Installed on every new dispatcher unless disabled in the configuration.
//! Each one is registered as a default, so the first user listener on the
//! same key replaces it.

use std::sync::Arc;

use events_core::{
    AutocompleteCompletion, AutocompleteError, CommandCompletion, CommandError,
    ComponentCompletion, ComponentError, ErrorEvent, Event, EventName, GenericError,
    ModalCompletion, ModalError,
};

use crate::listener::{listener_fn, ListenerOptions};
use crate::registry::ListenerRegistry;

pub(crate) fn install(registry: &ListenerRegistry) {
    let error_keys = [
        GenericError::event_name(),
        CommandError::event_name(),
        ComponentError::event_name(),
        AutocompleteError::event_name(),
        ModalError::event_name(),
    ];
    for key in error_keys {
        registry.register(
            key,
            listener_fn("default_error_handler", log_error),
            ListenerOptions::default_listener(),
        );
    }

    let completion_keys = [
        CommandCompletion::event_name(),
        ComponentCompletion::event_name(),
        AutocompleteCompletion::event_name(),
        ModalCompletion::event_name(),
    ];
    for key in completion_keys {
        registry.register(
            key,
            listener_fn("default_completion_logger", log_completion),
            ListenerOptions::default_listener(),
        );
    }
}

async fn log_error(event: Arc<dyn Event>) -> anyhow::Result<()> {
    let Some(error) = event.downcast_ref::<ErrorEvent>() else {
        return Ok(());
    };

    match (error.source(), event.context()) {
        (Some(source), ctx) => tracing::error!(
            source = %source,
            context = ?ctx.map(|c| c.to_string()),
            error = %error.failure(),
            "Ignoring exception"
        ),
        (None, Some(ctx)) => tracing::error!(
            kind = %error.kind(),
            context = %ctx,
            error = %error.failure(),
            "Ignoring exception in {}",
            ctx.label()
        ),
        (None, None) => tracing::error!(error = %error.failure(), "Ignoring exception"),
    }

    Ok(())
}

async fn log_completion(event: Arc<dyn Event>) -> anyhow::Result<()> {
    if let Some(ctx) = event.context() {
        tracing::debug!(event = %event.resolved_name(), context = %ctx, "Invocation completed");
    }
    Ok(())
}
