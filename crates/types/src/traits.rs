//! Backing-store traits shared across storefront crates.
//!
//! The token store composes one of each: a persistent key-value store for
//! both tokens and a cookie source consulted only for the access token.

use crate::error::Result;
use async_trait::async_trait;

/// Persistent string key-value storage (the client-side analogue of
/// `localStorage`).
///
/// Implementations may fail (quota, I/O, locked database); callers that must
/// not fail recover from the returned error locally.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Store (or overwrite) `value` under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Read-only cookie lookup by name.
pub trait CookieSource: Send + Sync {
    /// Value of the cookie called `name`, if present.
    fn cookie(&self, name: &str) -> Option<String>;
}
