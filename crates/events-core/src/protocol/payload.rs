//! Raw gateway payload
//!
//! What the transport hands to the event core: an opcode plus ordered data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::OpCode;
use crate::events::RawData;

/// A payload received from the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayload {
    /// Operation code
    pub op: OpCode,

    /// Event name (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayPayload {
    /// Create a Dispatch payload (op=0)
    #[must_use]
    pub fn dispatch(event_name: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_name.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Create a payload without event name or sequence
    #[must_use]
    pub fn op(op: OpCode, data: Option<Value>) -> Self {
        Self {
            op,
            t: None,
            s: None,
            d: data,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The data as an ordered map.
    ///
    /// Objects are taken as-is, `null` or missing data yields an empty map,
    /// and any other value is wrapped under the key `"d"`.
    #[must_use]
    pub fn into_data(self) -> RawData {
        match self.d {
            Some(Value::Object(map)) => map,
            None | Some(Value::Null) => Map::new(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("d".to_string(), other);
                map
            }
        }
    }
}

impl std::fmt::Display for GatewayPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayPayload(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayPayload(op={})", self.op)
        }
    }
}
