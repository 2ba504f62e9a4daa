//! Token store over a persistent key-value store and an optional cookie jar.
//!
//! Reads prefer the persistent store. Only the access token falls back to
//! cookies; the refresh token is never read from a cookie. None of the
//! operations here fail: backing-store errors are logged and reported as
//! "absent" or "not written".

use std::sync::Arc;
use storefront_types::{
    ACCESS_TOKEN_KEY, CookieSource, KeyValueStore, REFRESH_TOKEN_KEY, SetTokensOutcome, TokenPair,
};

/// Durable holder of the access/refresh token pair.
#[derive(Clone)]
pub struct TokenStore {
    persistent: Arc<dyn KeyValueStore>,
    cookies: Option<Arc<dyn CookieSource>>,
}

impl TokenStore {
    /// A store without cookie fallback.
    pub fn new(persistent: Arc<dyn KeyValueStore>) -> Self {
        Self {
            persistent,
            cookies: None,
        }
    }

    /// Consult `cookies` for the access token when the persistent store has none.
    #[must_use]
    pub fn with_cookies(mut self, cookies: Arc<dyn CookieSource>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Current access token: persistent store first, then the `access_token` cookie.
    pub async fn get_access_token(&self) -> Option<String> {
        if let Some(token) = self.read(ACCESS_TOKEN_KEY).await {
            return Some(token);
        }
        self.cookies
            .as_ref()
            .and_then(|jar| jar.cookie(ACCESS_TOKEN_KEY))
            .filter(|t| !t.trim().is_empty())
    }

    /// Current refresh token, from the persistent store only.
    pub async fn get_refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY).await
    }

    /// Both tokens as currently visible to readers.
    pub async fn snapshot(&self) -> TokenPair {
        TokenPair {
            access_token: self.get_access_token().await,
            refresh_token: self.get_refresh_token().await,
        }
    }

    /// Write both tokens. Blank values are rejected without touching storage.
    pub async fn set_tokens(&self, access: &str, refresh: &str) -> SetTokensOutcome {
        let access_set = self.write(ACCESS_TOKEN_KEY, access).await;
        if !access_set {
            tracing::warn!("access token not provided or not stored");
        }
        let refresh_set = self.write(REFRESH_TOKEN_KEY, refresh).await;
        if !refresh_set {
            tracing::warn!("refresh token not provided or not stored");
        }
        SetTokensOutcome {
            access_set,
            refresh_set,
        }
    }

    /// Write whichever halves of `pair` are present; absent halves keep
    /// their stored value.
    pub async fn update(&self, pair: &TokenPair) -> SetTokensOutcome {
        let access_set = match &pair.access_token {
            Some(token) => self.write(ACCESS_TOKEN_KEY, token).await,
            None => false,
        };
        let refresh_set = match &pair.refresh_token {
            Some(token) => self.write(REFRESH_TOKEN_KEY, token).await,
            None => false,
        };
        SetTokensOutcome {
            access_set,
            refresh_set,
        }
    }

    /// Remove both tokens from the persistent store.
    pub async fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.persistent.remove(key).await {
                tracing::warn!(key, error = %e, "failed to clear token");
            }
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.persistent.get(key).await {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read token");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        match self.persistent.set(key, value).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to store token");
                false
            }
        }
    }
}
