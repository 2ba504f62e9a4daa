//! Core types and traits for the storefront workspace.
//!
//! This crate defines the shared abstractions used across every layer of the
//! storefront client: the error taxonomy, decoded token claims, the stored
//! token pair, response shapes, and the backing-store traits that the store
//! crate implements.

pub mod error;
pub mod response;
pub mod token;
pub mod traits;

pub use error::ClientError;
pub use response::ListResponse;
pub use token::{ACCESS_TOKEN_KEY, Claims, REFRESH_TOKEN_KEY, SetTokensOutcome, TokenPair};
pub use traits::{CookieSource, KeyValueStore};
