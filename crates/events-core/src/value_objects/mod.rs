//! Value objects shared by events and contexts

mod snowflake;

pub use snowflake::{Snowflake, SnowflakeParseError};
