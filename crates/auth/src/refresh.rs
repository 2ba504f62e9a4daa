//! Refresh-token exchange.
//!
//! `POST {api_base}/users/refresh-token` with `{"refresh_token": "..."}`.
//! A 2xx answer may carry a new `access_token` and/or `refresh_token`;
//! whatever is present replaces the stored value.

use serde_json::{Value, json};
use storefront_store::TokenStore;
use storefront_types::TokenPair;
use tokio::sync::Mutex;

/// Exchanges the stored refresh token for new tokens.
///
/// Refreshes are serialized: callers that were rejected with the same
/// access token share one exchange instead of each sending their own.
pub struct RefreshClient {
    http: reqwest::Client,
    refresh_url: String,
    store: TokenStore,
    lock: Mutex<()>,
}

impl RefreshClient {
    pub fn new(http: reqwest::Client, refresh_url: impl Into<String>, store: TokenStore) -> Self {
        Self {
            http,
            refresh_url: refresh_url.into(),
            store,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }

    /// Exchange the stored refresh token now.
    ///
    /// Returns `false` without a network call when no refresh token is
    /// stored, and `false` on any transport failure or non-2xx answer.
    pub async fn refresh_access_token(&self) -> bool {
        let _guard = self.lock.lock().await;
        self.exchange().await
    }

    /// Refresh after a request carrying `rejected` came back 401.
    ///
    /// If the stored access token already differs from `rejected`, another
    /// caller refreshed while this one waited and no exchange is made.
    pub async fn refresh_after_rejection(&self, rejected: Option<&str>) -> bool {
        let _guard = self.lock.lock().await;
        let current = self.store.get_access_token().await;
        if current.is_some() && current.as_deref() != rejected {
            tracing::debug!("access token already refreshed by a concurrent request");
            return true;
        }
        self.exchange().await
    }

    async fn exchange(&self) -> bool {
        let Some(refresh_token) = self.store.get_refresh_token().await else {
            tracing::debug!("no refresh token stored");
            return false;
        };

        let resp = match self
            .http
            .post(&self.refresh_url)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh request failed");
                return false;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "token refresh rejected");
            return false;
        }

        match resp.json::<Value>().await {
            Ok(body) => {
                let pair = TokenPair::from_json(&body);
                let outcome = self.store.update(&pair).await;
                tracing::info!(
                    access_set = outcome.access_set,
                    refresh_set = outcome.refresh_set,
                    "token refreshed"
                );
            }
            Err(e) => tracing::warn!(error = %e, "token refresh response is not JSON"),
        }
        true
    }
}
