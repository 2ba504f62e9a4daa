//! Wiring of config, token store, refresh and executor into one handle.

use crate::{
    api::StorefrontApi, executor::RequestExecutor, models::ActionResult, retry::RetryPolicy,
};
use std::sync::Arc;
use storefront_auth::{AccessGuard, RefreshClient};
use storefront_config::Config;
use storefront_store::TokenStore;
use storefront_types::error::Result;

/// Everything a front end needs to talk to the storefront API.
#[derive(Clone)]
pub struct StorefrontClient {
    store: TokenStore,
    executor: Arc<RequestExecutor>,
    api: StorefrontApi,
}

impl StorefrontClient {
    /// Build a client for the API base resolved from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`](storefront_types::ClientError::Configuration)
    /// if the API base is invalid, or
    /// [`ClientError::Transport`](storefront_types::ClientError::Transport) if
    /// the HTTP client cannot be built.
    pub fn from_config(config: &Config, store: TokenStore) -> Result<Self> {
        let base = config.resolve_api_base()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let refresh = Arc::new(RefreshClient::new(
            http.clone(),
            config.refresh_url()?,
            store.clone(),
        ));
        let executor = Arc::new(RequestExecutor::new(http, store.clone(), refresh));
        let api = StorefrontApi::new(
            executor.clone(),
            base.clone(),
            RetryPolicy::from_config(&config.retry),
        );
        tracing::debug!(api_base = %base, "storefront client ready");
        Ok(Self {
            store,
            executor,
            api,
        })
    }

    #[must_use]
    pub fn api(&self) -> &StorefrontApi {
        &self.api
    }

    #[must_use]
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    #[must_use]
    pub fn guard(&self) -> AccessGuard {
        AccessGuard::new(self.store.clone())
    }

    /// Forget the stored tokens. With `remote`, sign out on the server first.
    ///
    /// Local tokens are cleared whatever the server says; a failed remote
    /// sign-out is logged and returned as `Err` for display.
    pub async fn logout(&self, remote: bool) -> Option<Result<ActionResult>> {
        let remote_result = if remote {
            let result = self.api.sign_out().await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, "remote sign-out failed, clearing local tokens anyway");
            }
            Some(result)
        } else {
            None
        };
        self.store.clear().await;
        remote_result
    }
}
