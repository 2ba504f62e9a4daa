//! Authenticated request execution with a single refresh-and-retry on 401.
//!
//! Per logical request: send with the stored bearer token; on 401 refresh
//! once and retry once. There is never a second refresh for the same
//! request.

use crate::request::RequestOptions;
use reqwest::{
    StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;
use std::sync::Arc;
use storefront_auth::RefreshClient;
use storefront_store::TokenStore;
use storefront_types::{ClientError, error::Result};

/// Sends requests with the stored access token attached.
pub struct RequestExecutor {
    http: reqwest::Client,
    store: TokenStore,
    refresh: Arc<RefreshClient>,
}

impl RequestExecutor {
    pub fn new(http: reqwest::Client, store: TokenStore, refresh: Arc<RefreshClient>) -> Self {
        Self {
            http,
            store,
            refresh,
        }
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Exchange the stored refresh token now. See [`RefreshClient::refresh_access_token`].
    pub async fn refresh_access_token(&self) -> bool {
        self.refresh.refresh_access_token().await
    }

    /// Send one logical request and return its JSON body.
    ///
    /// An empty success body is returned as [`Value::Null`].
    ///
    /// # Errors
    ///
    /// - [`ClientError::Configuration`] if `url` is empty or a header is invalid.
    /// - [`ClientError::Authentication`] if a 401 could not be recovered by
    ///   refreshing, or the retried request failed.
    /// - [`ClientError::Http`] for any other non-2xx status.
    /// - [`ClientError::Transport`] if no response was received.
    /// - [`ClientError::Decode`] if a success body is not JSON.
    pub async fn send(&self, url: &str, options: RequestOptions) -> Result<Value> {
        if url.trim().is_empty() {
            return Err(ClientError::Configuration("request URL is empty".into()));
        }

        let token = self.store.get_access_token().await;
        tracing::debug!(method = %options.method, url, authenticated = token.is_some(), "sending request");
        let resp = self.dispatch(url, &options, token.as_deref()).await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            tracing::info!(url, "access token rejected, refreshing");
            if !self.refresh.refresh_after_rejection(token.as_deref()).await {
                tracing::warn!(url, "token refresh failed");
                return Err(ClientError::authentication());
            }
            let Some(token) = self.store.get_access_token().await else {
                tracing::warn!(url, "no access token after refresh");
                return Err(ClientError::authentication());
            };

            let retried = self.dispatch(url, &options, Some(&token)).await?;
            let status = retried.status();
            if !status.is_success() {
                tracing::warn!(url, status = status.as_u16(), "retried request failed");
                return Err(ClientError::authentication());
            }
            return read_json(retried).await;
        }

        finish(url, resp).await
    }

    /// Send without the stored token, for public endpoints.
    ///
    /// A 401 is reported as [`ClientError::Http`] and never triggers a
    /// refresh.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), minus [`ClientError::Authentication`].
    pub async fn send_anonymous(&self, url: &str, options: RequestOptions) -> Result<Value> {
        if url.trim().is_empty() {
            return Err(ClientError::Configuration("request URL is empty".into()));
        }
        tracing::debug!(method = %options.method, url, "sending anonymous request");
        let resp = self.dispatch(url, &options, None).await?;
        finish(url, resp).await
    }

    async fn dispatch(
        &self,
        url: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .request(options.method.clone(), url)
            .headers(build_headers(options, token)?);
        if let Some(body) = &options.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }
        Ok(builder.send().await?)
    }
}

async fn finish(url: &str, resp: reqwest::Response) -> Result<Value> {
    if !resp.status().is_success() {
        let err = error_from_response(resp).await;
        tracing::debug!(url, error = %err, "request failed");
        return Err(err);
    }
    read_json(resp).await
}

fn build_headers(options: &RequestOptions, token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::Configuration(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::Configuration(format!("invalid value for {name}: {e}")))?;
        headers.insert(name, value);
    }
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ClientError::Configuration(format!("invalid access token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

async fn read_json(resp: reqwest::Response) -> Result<Value> {
    let bytes = resp.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Map a non-2xx response to [`ClientError::Http`], preferring the body's
/// `error` field over the status line.
async fn error_from_response(resp: reqwest::Response) -> ClientError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let server_message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| match body.get("error") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Null | Value::String(_)) | None => None,
            Some(other) => Some(other.to_string()),
        });
    ClientError::Http {
        status: status.as_u16(),
        message: server_message.unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        }),
    }
}
