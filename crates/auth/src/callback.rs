//! OAuth sign-in callback handling.
//!
//! After a third-party sign-in the backend redirects the browser to the
//! client with `success`, `access_token`, `refresh_token` and `redirect`
//! query parameters. [`OAuthCallback`] parses them and [`OAuthCallback::handle`]
//! stores the tokens. For command-line use, [`bind_callback`] and
//! [`accept_callback`] receive that redirect on a local port.

use serde::Deserialize;
use std::time::Duration;
use storefront_store::TokenStore;
use storefront_types::{ClientError, error::Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const TIMEOUT_SECS: u64 = 120;
const SUCCESS_MARKER: &str = "True";
const DONE_HTML: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Sign-in received</h1><p>You may close this tab.</p></body></html>";

/// Query parameters of a sign-in redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OAuthCallback {
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// What a page should do after inspecting its query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// No callback parameters present; render normally.
    NotACallback,
    /// Tokens were stored. `redirect` is the post-sign-in destination, if any.
    SignedIn {
        access_set: bool,
        refresh_set: bool,
        redirect: Option<String>,
    },
    /// The backend reported failure.
    Failed { reason: String },
}

impl OAuthCallback {
    /// Parse a query string, with or without the leading `?`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if the query is not valid
    /// `application/x-www-form-urlencoded`.
    pub fn from_query(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        serde_urlencoded::from_str(query)
            .map_err(|e| ClientError::Decode(format!("invalid callback query: {e}")))
    }

    /// Parse the query out of a raw HTTP request line such as
    /// `GET /auth?success=True&... HTTP/1.1`.
    ///
    /// # Errors
    ///
    /// See [`OAuthCallback::from_query`].
    pub fn from_request(request: &str) -> Result<Self> {
        let first_line = request.lines().next().unwrap_or("");
        let target = first_line.split_ascii_whitespace().nth(1).unwrap_or("/");
        let query = target.split_once('?').map_or("", |(_, q)| q);
        Self::from_query(query)
    }

    #[must_use]
    pub fn is_callback(&self) -> bool {
        self.success.is_some() || self.access_token.is_some() || self.refresh_token.is_some()
    }

    /// Store the delivered tokens when the backend reported success.
    pub async fn handle(&self, store: &TokenStore) -> CallbackOutcome {
        if !self.is_callback() {
            return CallbackOutcome::NotACallback;
        }
        if self.success.as_deref() != Some(SUCCESS_MARKER) {
            let reason = self
                .success
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            tracing::warn!(%reason, "sign-in callback reported failure");
            return CallbackOutcome::Failed { reason };
        }

        let outcome = store
            .set_tokens(
                self.access_token.as_deref().unwrap_or(""),
                self.refresh_token.as_deref().unwrap_or(""),
            )
            .await;
        tracing::info!(
            access_set = outcome.access_set,
            refresh_set = outcome.refresh_set,
            "sign-in callback handled"
        );
        CallbackOutcome::SignedIn {
            access_set: outcome.access_set,
            refresh_set: outcome.refresh_set,
            redirect: self
                .redirect
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        }
    }
}

/// Bind the local callback port.
///
/// Bind before opening the browser, then call [`accept_callback`].
///
/// # Errors
///
/// Returns [`ClientError::Configuration`] if the port cannot be bound.
pub async fn bind_callback(port: u16) -> Result<TcpListener> {
    let addr = format!("127.0.0.1:{port}");
    TcpListener::bind(&addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            ClientError::Configuration(format!("callback port {port} is already in use"))
        } else {
            ClientError::Configuration(format!("cannot bind callback port {port}: {e}"))
        }
    })
}

/// Wait for a single sign-in redirect on `listener`. Times out after two minutes.
///
/// # Errors
///
/// Returns [`ClientError::Transport`] on I/O failure or timeout, and
/// [`ClientError::Decode`] if the query cannot be parsed.
pub async fn accept_callback(listener: TcpListener) -> Result<OAuthCallback> {
    let accept = async {
        let (mut stream, peer) = listener
            .accept()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        tracing::debug!(%peer, "callback connection accepted");

        let mut buf = vec![0u8; 8192];
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let callback = OAuthCallback::from_request(&String::from_utf8_lossy(&buf[..n]))?;

        stream
            .write_all(DONE_HTML)
            .await
            .map_err(|e| ClientError::Transport(format!("write error: {e}")))?;
        let _ = stream.shutdown().await;
        Ok::<OAuthCallback, ClientError>(callback)
    };

    tokio::time::timeout(Duration::from_secs(TIMEOUT_SECS), accept)
        .await
        .map_err(|_| ClientError::Transport("timed out waiting for sign-in callback".into()))?
}
