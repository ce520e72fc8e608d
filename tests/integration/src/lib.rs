//! Integration test utilities for the event core
//!
//! Recording listeners, a counting fault reporter and context fixtures for
//! end-to-end dispatch tests.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
