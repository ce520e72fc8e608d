//! Event shapes
//!
//! Every type the core can dispatch, grouped by family.

mod completion;
mod errors;
mod interaction;
mod lifecycle;
mod raw;

pub use completion::{
    completion_event, AutocompleteCompletion, CommandCompletion, ComponentCompletion,
    ModalCompletion,
};
pub use errors::{
    AutocompleteError, CommandError, ComponentError, ErrorDetails, ErrorEvent, GenericError,
    ModalError,
};
pub use interaction::{component_events, ButtonPressed, Component, Select};
pub use lifecycle::{
    Connect, Disconnect, Login, Ready, Resume, ShardConnect, ShardDisconnect, Startup,
};
pub use raw::{RawData, RawGatewayEvent, WebsocketReady};
