//! Token-aware HTTP client for the storefront API.
//!
//! [`RequestExecutor`] attaches the stored bearer token and recovers from a
//! single 401 by refreshing. [`StorefrontApi`] layers the typed endpoints
//! on top, and [`StorefrontClient`] builds both from a
//! [`Config`](storefront_config::Config).

pub mod api;
pub mod client;
pub mod executor;
pub mod models;
pub mod request;
pub mod retry;

#[cfg(test)]
mod testing;

pub use api::{PAYMENT_FAILURE_MESSAGE, PAYMENT_SUCCESS_MESSAGE, StorefrontApi};
pub use client::StorefrontClient;
pub use executor::RequestExecutor;
pub use models::{
    ActionResult, ContactMessage, EmailVerification, Plan, SignInCredentials, SignInResult,
    SignUpRequest, UsageRecord, UsageStatistics, UsageUser, UserProfile,
};
pub use request::RequestOptions;
pub use retry::RetryPolicy;
