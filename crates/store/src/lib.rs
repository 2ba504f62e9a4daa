//! Client-side credential storage.
//!
//! Provides [`KeyValueStore`](storefront_types::KeyValueStore) backends (an
//! in-memory map for tests and ephemeral sessions, `SQLite` for durable
//! storage), a [`CookieJar`] parsed from a `Cookie` header, and the
//! [`TokenStore`] that layers the fixed token keys on top of them.

pub mod cookie;
pub mod memory;
pub mod sqlite;
pub mod tokens;

pub use cookie::CookieJar;
pub use memory::InMemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
pub use tokens::TokenStore;
