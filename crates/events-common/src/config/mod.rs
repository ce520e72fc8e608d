//! Configuration structs

mod dispatch_config;

pub use dispatch_config::{ConfigError, DispatchConfig, Environment};
