//! Test fixtures and data generators
//!
//! Invocation contexts with unique ids for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};

use events_core::{
    AutocompleteContext, CommandContext, ComponentContext, InteractionMeta, ModalContext,
    Snowflake,
};
use serde_json::{json, Map, Value};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique id for test data
pub fn unique_id() -> Snowflake {
    Snowflake::new(COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// Interaction identifiers inside a test guild
pub fn interaction() -> InteractionMeta {
    InteractionMeta::new(unique_id(), unique_id(), unique_id()).in_guild(Snowflake::new(1))
}

pub fn command(name: &str) -> CommandContext {
    CommandContext::new(interaction(), name)
}

pub fn button(custom_id: &str) -> ComponentContext {
    ComponentContext::button(interaction(), custom_id)
}

pub fn select(custom_id: &str, values: &[&str]) -> ComponentContext {
    ComponentContext::select(
        interaction(),
        custom_id,
        values.iter().map(ToString::to_string).collect(),
    )
}

pub fn autocomplete(command: &str, option: &str, input: &str) -> AutocompleteContext {
    AutocompleteContext::new(interaction(), command, option, input)
}

pub fn modal(custom_id: &str) -> ModalContext {
    let mut responses = Map::new();
    responses.insert("title".to_string(), json!("Bug report"));
    responses.insert("body".to_string(), json!("It crashed"));
    ModalContext::new(interaction(), custom_id, responses)
}

/// Positional and keyword arguments of a fake invocation
pub fn call_args() -> (Vec<Value>, Map<String, Value>) {
    let mut kwargs = Map::new();
    kwargs.insert("user".to_string(), json!("175928847299117063"));
    kwargs.insert("ephemeral".to_string(), json!(true));
    (vec![json!("hello"), json!(3)], kwargs)
}
