//! Invocation contexts
//!
//! The routing layer builds one of these for every command, component,
//! autocomplete or modal callback it runs. The event core only carries them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value_objects::Snowflake;

/// Which kind of invocation was executing when something happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    /// No invocation was active
    #[default]
    None,
    Command,
    Component,
    Autocomplete,
    Modal,
}

impl ContextKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Command => "command",
            Self::Component => "component",
            Self::Autocomplete => "autocomplete",
            Self::Modal => "modal",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers shared by every interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionMeta {
    pub interaction_id: Snowflake,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
}

impl InteractionMeta {
    #[must_use]
    pub fn new(interaction_id: Snowflake, channel_id: Snowflake, author_id: Snowflake) -> Self {
        Self {
            interaction_id,
            guild_id: None,
            channel_id,
            author_id,
        }
    }

    #[must_use]
    pub fn in_guild(mut self, guild_id: Snowflake) -> Self {
        self.guild_id = Some(guild_id);
        self
    }
}

/// Context of an application command invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandContext {
    #[serde(flatten)]
    pub interaction: InteractionMeta,
    pub command_name: String,
}

impl CommandContext {
    #[must_use]
    pub fn new(interaction: InteractionMeta, command_name: impl Into<String>) -> Self {
        Self {
            interaction,
            command_name: command_name.into(),
        }
    }
}

/// Kind of message component that was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Button,
    Select,
}

/// Context of a component callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentContext {
    #[serde(flatten)]
    pub interaction: InteractionMeta,
    pub custom_id: String,
    pub component_type: ComponentType,
    /// Selected values; empty for buttons
    #[serde(default)]
    pub values: Vec<String>,
}

impl ComponentContext {
    #[must_use]
    pub fn button(interaction: InteractionMeta, custom_id: impl Into<String>) -> Self {
        Self {
            interaction,
            custom_id: custom_id.into(),
            component_type: ComponentType::Button,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn select(
        interaction: InteractionMeta,
        custom_id: impl Into<String>,
        values: Vec<String>,
    ) -> Self {
        Self {
            interaction,
            custom_id: custom_id.into(),
            component_type: ComponentType::Select,
            values,
        }
    }
}

/// Context of an autocomplete callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutocompleteContext {
    #[serde(flatten)]
    pub interaction: InteractionMeta,
    pub command_name: String,
    /// Name of the option being typed into
    pub focused_option: String,
    /// What the user has typed so far
    #[serde(default)]
    pub input: String,
}

impl AutocompleteContext {
    #[must_use]
    pub fn new(
        interaction: InteractionMeta,
        command_name: impl Into<String>,
        focused_option: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            interaction,
            command_name: command_name.into(),
            focused_option: focused_option.into(),
            input: input.into(),
        }
    }
}

/// Context of a modal submission callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalContext {
    #[serde(flatten)]
    pub interaction: InteractionMeta,
    pub custom_id: String,
    /// Submitted field values keyed by field custom id, in form order
    #[serde(default)]
    pub responses: Map<String, Value>,
}

impl ModalContext {
    #[must_use]
    pub fn new(
        interaction: InteractionMeta,
        custom_id: impl Into<String>,
        responses: Map<String, Value>,
    ) -> Self {
        Self {
            interaction,
            custom_id: custom_id.into(),
            responses,
        }
    }
}

/// Any invocation context, shared between the invocation and its events
#[derive(Debug, Clone)]
pub enum InvocationContext {
    Command(Arc<CommandContext>),
    Component(Arc<ComponentContext>),
    Autocomplete(Arc<AutocompleteContext>),
    Modal(Arc<ModalContext>),
}

impl InvocationContext {
    #[must_use]
    pub fn kind(&self) -> ContextKind {
        match self {
            Self::Command(_) => ContextKind::Command,
            Self::Component(_) => ContextKind::Component,
            Self::Autocomplete(_) => ContextKind::Autocomplete,
            Self::Modal(_) => ContextKind::Modal,
        }
    }

    #[must_use]
    pub fn interaction(&self) -> &InteractionMeta {
        match self {
            Self::Command(ctx) => &ctx.interaction,
            Self::Component(ctx) => &ctx.interaction,
            Self::Autocomplete(ctx) => &ctx.interaction,
            Self::Modal(ctx) => &ctx.interaction,
        }
    }

    /// Short human-readable label, e.g. ``command `ping` ``
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Command(ctx) => format!("command `{}`", ctx.command_name),
            Self::Component(ctx) => format!("component `{}`", ctx.custom_id),
            Self::Autocomplete(ctx) => format!(
                "autocomplete `{}` ({})",
                ctx.command_name, ctx.focused_option
            ),
            Self::Modal(ctx) => format!("modal `{}`", ctx.custom_id),
        }
    }
}

impl fmt::Display for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (interaction {})",
            self.label(),
            self.interaction().interaction_id
        )
    }
}

macro_rules! context_conversions {
    ($($variant:ident => $ctx:ty),* $(,)?) => {
        $(
            impl From<Arc<$ctx>> for InvocationContext {
                fn from(ctx: Arc<$ctx>) -> Self {
                    Self::$variant(ctx)
                }
            }

            impl From<$ctx> for InvocationContext {
                fn from(ctx: $ctx) -> Self {
                    Self::$variant(Arc::new(ctx))
                }
            }
        )*
    };
}

context_conversions! {
    Command => CommandContext,
    Component => ComponentContext,
    Autocomplete => AutocompleteContext,
    Modal => ModalContext,
}
