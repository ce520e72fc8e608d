//! Component interaction events

use std::sync::Arc;

use crate::context::{ComponentContext, ComponentType};
use crate::{impl_event, Event};

/// Dispatched when a user uses any component.
#[derive(Debug)]
pub struct Component {
    pub ctx: Arc<ComponentContext>,
}

/// Dispatched when a user presses a button.
#[derive(Debug)]
pub struct ButtonPressed {
    pub ctx: Arc<ComponentContext>,
}

/// Dispatched when a user uses a select menu.
#[derive(Debug)]
pub struct Select {
    pub ctx: Arc<ComponentContext>,
}

impl_event!(Component, Interaction, context = ctx);
impl_event!(ButtonPressed, Interaction, context = ctx);
impl_event!(Select, Interaction, context = ctx);

impl Component {
    #[must_use]
    pub fn new(ctx: Arc<ComponentContext>) -> Self {
        Self { ctx }
    }
}

impl From<ButtonPressed> for Component {
    fn from(event: ButtonPressed) -> Self {
        Self { ctx: event.ctx }
    }
}

impl From<Select> for Component {
    fn from(event: Select) -> Self {
        Self { ctx: event.ctx }
    }
}

/// Events for one component interaction: the generic [`Component`] event
/// followed by the specialized one for its component type.
#[must_use]
pub fn component_events(ctx: &Arc<ComponentContext>) -> Vec<Arc<dyn Event>> {
    let specific: Arc<dyn Event> = match ctx.component_type {
        ComponentType::Button => Arc::new(ButtonPressed {
            ctx: Arc::clone(ctx),
        }),
        ComponentType::Select => Arc::new(Select {
            ctx: Arc::clone(ctx),
        }),
    };

    vec![Arc::new(Component::new(Arc::clone(ctx))), specific]
}
