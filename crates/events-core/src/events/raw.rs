//! Raw gateway events
//!
//! Payloads that have not been given a richer typed shape are passed to
//! listeners verbatim.

use std::any::Any;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::naming::derive_dispatch_key;
use crate::{impl_event, impl_event_name, Event, EventFamily, EventName};

/// Ordered key/value data of a gateway payload
pub type RawData = Map<String, Value>;

/// A gateway payload dispatched as-is.
///
/// The dispatch key is `raw_gateway_event` unless an instance name is set,
/// which the gateway translation does for every dispatch (`raw_message_create`,
/// `raw_ready`, ...).
#[derive(Debug, Default)]
pub struct RawGatewayEvent {
    pub data: RawData,
    override_name: Option<String>,
}

impl RawGatewayEvent {
    #[must_use]
    pub fn new(data: RawData) -> Self {
        Self {
            data,
            override_name: None,
        }
    }

    /// Create a raw event dispatched under `name` (derived like a type name).
    #[must_use]
    pub fn named(name: &str, data: RawData) -> Self {
        Self {
            data,
            override_name: Some(derive_dispatch_key(name)),
        }
    }

    #[must_use]
    pub fn override_name(&self) -> Option<&str> {
        self.override_name.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl_event_name!(RawGatewayEvent);

impl Event for RawGatewayEvent {
    fn resolved_name(&self) -> &str {
        self.override_name
            .as_deref()
            .unwrap_or_else(|| Self::event_name())
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn family(&self) -> EventFamily {
        EventFamily::Raw
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// The gateway reported that it is ready.
///
/// Carries the READY payload untouched (session id, user, guild stubs, ...).
#[derive(Debug, Default)]
pub struct WebsocketReady {
    pub data: RawData,
}

impl WebsocketReady {
    #[must_use]
    pub fn new(data: RawData) -> Self {
        Self { data }
    }

    /// Session id announced by the gateway, if present.
    pub fn session_id(&self) -> Option<&str> {
        self.data.get("session_id").and_then(Value::as_str)
    }
}

impl_event!(WebsocketReady, Raw);
