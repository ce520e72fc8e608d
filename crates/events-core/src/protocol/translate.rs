//! Payload translation
//!
//! Turns a gateway payload into the events the dispatcher should fan out.
//! Every dispatch is passed through as a named [`RawGatewayEvent`]; the few
//! payloads the core understands also produce their typed event.

use std::sync::Arc;

use super::{GatewayPayload, OpCode};
use crate::events::{RawGatewayEvent, Resume, WebsocketReady};
use crate::naming::derive_dispatch_key;
use crate::Event;

const READY: &str = "READY";
const RESUMED: &str = "RESUMED";

/// Translate one payload into events, in dispatch order.
#[must_use]
pub fn translate(payload: GatewayPayload) -> Vec<Arc<dyn Event>> {
    let op = payload.op;
    let event_name = payload.t.clone();
    let data = payload.into_data();

    let Some(event_name) = event_name.filter(|_| op == OpCode::Dispatch) else {
        let name = format!("raw_{}", derive_dispatch_key(op.name()));
        return vec![Arc::new(RawGatewayEvent::named(&name, data))];
    };

    let raw_name = format!("raw_{}", event_name.to_lowercase());
    let mut events: Vec<Arc<dyn Event>> = Vec::with_capacity(2);

    match event_name.as_str() {
        READY => {
            events.push(Arc::new(RawGatewayEvent::named(&raw_name, data.clone())));
            events.push(Arc::new(WebsocketReady::new(data)));
        }
        RESUMED => {
            events.push(Arc::new(RawGatewayEvent::named(&raw_name, data)));
            events.push(Arc::new(Resume));
        }
        _ => events.push(Arc::new(RawGatewayEvent::named(&raw_name, data))),
    }

    events
}
