//! Gateway payload boundary
//!
//! Defines what the transport hands over and how it becomes events.

mod opcodes;
mod payload;
mod translate;

pub use opcodes::OpCode;
pub use payload::GatewayPayload;
pub use translate::translate;
