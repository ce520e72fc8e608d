//! Client lifecycle events
//!
//! These carry no payload of their own; the type is the information.

use crate::impl_event;

/// The client has just logged in.
#[derive(Debug, Default)]
pub struct Login;

/// The client is now connected to the gateway.
#[derive(Debug, Default)]
pub struct Connect;

/// The client has resumed its gateway connection.
#[derive(Debug, Default)]
pub struct Resume;

/// The client has just disconnected.
#[derive(Debug, Default)]
pub struct Disconnect;

/// A shard just connected to the gateway.
///
/// Structurally a [`Connect`], but dispatched under its own key.
#[derive(Debug)]
pub struct ShardConnect {
    pub shard_id: u32,
}

impl ShardConnect {
    #[must_use]
    pub const fn new(shard_id: u32) -> Self {
        Self { shard_id }
    }

    #[must_use]
    pub const fn shard_id(&self) -> u32 {
        self.shard_id
    }

    /// View this event as the connect event it specializes.
    #[must_use]
    pub const fn as_connect(&self) -> Connect {
        Connect
    }
}

/// A shard just disconnected.
///
/// Structurally a [`Disconnect`], but dispatched under its own key.
#[derive(Debug)]
pub struct ShardDisconnect {
    pub shard_id: u32,
}

impl ShardDisconnect {
    #[must_use]
    pub const fn new(shard_id: u32) -> Self {
        Self { shard_id }
    }

    #[must_use]
    pub const fn shard_id(&self) -> u32 {
        self.shard_id
    }

    #[must_use]
    pub const fn as_disconnect(&self) -> Disconnect {
        Disconnect
    }
}

/// The client is ready for the first time.
///
/// Fired once per process; use it for one-off setup instead of [`Ready`].
#[derive(Debug, Default)]
pub struct Startup;

/// The client is ready.
///
/// May fire several times over the life of a client (e.g. after a full
/// reconnect).
#[derive(Debug, Default)]
pub struct Ready;

impl_event!(Login, Lifecycle);
impl_event!(Connect, Lifecycle);
impl_event!(Resume, Lifecycle);
impl_event!(Disconnect, Lifecycle);
impl_event!(ShardConnect, Lifecycle);
impl_event!(ShardDisconnect, Lifecycle);
impl_event!(Startup, Lifecycle);
impl_event!(Ready, Lifecycle);
