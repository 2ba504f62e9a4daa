//! Configuration loading for the storefront client.
//!
//! Uses figment to layer serialized defaults, an optional YAML file, and
//! `STOREFRONT_`-prefixed environment variables.

pub mod schema;

pub use schema::{Config, Environment, LogConfig, RetryConfig};
