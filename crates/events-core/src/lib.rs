//! # events-core
//!
//! Event taxonomy of the gateway client: typed event shapes, the dispatch key
//! naming rule, invocation contexts, and translation of raw gateway payloads.
//! This crate has no runtime dependencies; scheduling lives in `events-dispatch`.

pub mod context;
pub mod event;
pub mod events;
pub mod failure;
pub mod naming;
pub mod protocol;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use context::{
    AutocompleteContext, CommandContext, ComponentContext, ComponentType, ContextKind,
    InteractionMeta, InvocationContext, ModalContext,
};
pub use event::{downcast_arc, Event, EventFamily};
pub use events::{
    completion_event, component_events, AutocompleteCompletion, AutocompleteError, ButtonPressed,
    CommandCompletion, CommandError, Component, ComponentCompletion, ComponentError, Connect,
    Disconnect, ErrorDetails, ErrorEvent, GenericError, Login, ModalCompletion, ModalError,
    RawData, RawGatewayEvent, Ready, Resume, Select, ShardConnect, ShardDisconnect, Startup,
    WebsocketReady,
};
pub use failure::{ListenerFailure, ListenerPanic};
pub use naming::{derive_dispatch_key, normalize_listener_key, EventName, WILDCARD_KEY};
pub use protocol::{translate, GatewayPayload, OpCode};
pub use value_objects::{Snowflake, SnowflakeParseError};
