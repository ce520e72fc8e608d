//! Gateway operation codes
//!
//! The event core never speaks the protocol; it only needs to name the
//! opcode of every payload the transport hands over.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Gateway operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// An event was dispatched (receive)
    Dispatch = 0,
    /// Keep the connection alive (send/receive)
    Heartbeat = 1,
    /// Start a new session (send)
    Identify = 2,
    /// Update the client's presence (send)
    PresenceUpdate = 3,
    /// Join, leave or move between voice channels (send)
    VoiceStateUpdate = 4,
    /// Resume a previous session (send)
    Resume = 6,
    /// Reconnect and resume immediately (receive)
    Reconnect = 7,
    /// Request guild member chunks (send)
    RequestGuildMembers = 8,
    /// The session has been invalidated (receive)
    InvalidSession = 9,
    /// Sent immediately after connecting (receive)
    Hello = 10,
    /// Heartbeat acknowledged (receive)
    HeartbeatAck = 11,
}

impl OpCode {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::PresenceUpdate),
            4 => Some(Self::VoiceStateUpdate),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            8 => Some(Self::RequestGuildMembers),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "Dispatch",
            Self::Heartbeat => "Heartbeat",
            Self::Identify => "Identify",
            Self::PresenceUpdate => "PresenceUpdate",
            Self::VoiceStateUpdate => "VoiceStateUpdate",
            Self::Resume => "Resume",
            Self::Reconnect => "Reconnect",
            Self::RequestGuildMembers => "RequestGuildMembers",
            Self::InvalidSession => "InvalidSession",
            Self::Hello => "Hello",
            Self::HeartbeatAck => "HeartbeatAck",
        }
    }
}

impl Serialize for OpCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for OpCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid op code: {value}")))
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}
