//! Completion events
//!
//! Fired once after an application callback returned without failing. They
//! are purely observational.

use std::sync::Arc;

use crate::context::{
    AutocompleteContext, CommandContext, ComponentContext, InvocationContext, ModalContext,
};
use crate::{impl_event, Event};

/// Dispatched after a command callback ran.
#[derive(Debug)]
pub struct CommandCompletion {
    pub ctx: Arc<CommandContext>,
}

/// Dispatched after a component callback ran.
#[derive(Debug)]
pub struct ComponentCompletion {
    pub ctx: Arc<ComponentContext>,
}

/// Dispatched after an autocomplete callback ran.
#[derive(Debug)]
pub struct AutocompleteCompletion {
    pub ctx: Arc<AutocompleteContext>,
}

/// Dispatched after a modal callback ran.
#[derive(Debug)]
pub struct ModalCompletion {
    pub ctx: Arc<ModalContext>,
}

impl_event!(CommandCompletion, Completion, context = ctx);
impl_event!(ComponentCompletion, Completion, context = ctx);
impl_event!(AutocompleteCompletion, Completion, context = ctx);
impl_event!(ModalCompletion, Completion, context = ctx);

/// Build the completion event matching an invocation context.
#[must_use]
pub fn completion_event(ctx: InvocationContext) -> Arc<dyn Event> {
    match ctx {
        InvocationContext::Command(ctx) => Arc::new(CommandCompletion { ctx }),
        InvocationContext::Component(ctx) => Arc::new(ComponentCompletion { ctx }),
        InvocationContext::Autocomplete(ctx) => Arc::new(AutocompleteCompletion { ctx }),
        InvocationContext::Modal(ctx) => Arc::new(ModalCompletion { ctx }),
    }
}
