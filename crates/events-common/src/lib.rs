//! # events-common
//!
//! Shared utilities for the event core: environment-driven configuration and
//! tracing setup.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{ConfigError, DispatchConfig, Environment};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
