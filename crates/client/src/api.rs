//! Typed storefront endpoints on top of [`RequestExecutor`].

use crate::{
    executor::RequestExecutor,
    models::{
        ActionResult, ContactMessage, EmailVerification, Plan, SignInCredentials, SignInResult,
        SignUpRequest, UsageRecord, UsageStatistics, UserProfile,
    },
    request::RequestOptions,
    retry::RetryPolicy,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use storefront_types::{ClientError, ListResponse, SetTokensOutcome, TokenPair, error::Result};

const CALLBACK_HEADER: &str = "Client-Callback-Url";

/// Fallback for a confirmed payment without a server message.
pub const PAYMENT_SUCCESS_MESSAGE: &str = "Transaction completed successfully!";
/// Fallback for a failed payment without a server error.
pub const PAYMENT_FAILURE_MESSAGE: &str = "Error processing transaction.";

fn decode<T: DeserializeOwned>(what: &str, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| ClientError::Decode(format!("{what}: {e}")))
}

/// The message of an error status; other errors pass through.
fn http_failure_message(err: ClientError) -> Result<String> {
    match err {
        ClientError::Http { message, .. } => Ok(message),
        other => Err(other),
    }
}

/// Storefront endpoints relative to one API base.
#[derive(Clone)]
pub struct StorefrontApi {
    executor: Arc<RequestExecutor>,
    base: String,
    retry: RetryPolicy,
}

impl StorefrontApi {
    /// `base` is the API root without a trailing slash, e.g.
    /// `https://api.simplylovely.ng/api`.
    pub fn new(executor: Arc<RequestExecutor>, base: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            executor,
            base: base.into(),
            retry,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Authenticated `GET` of an arbitrary path under the API base.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.executor.send(&self.url(path), RequestOptions::get()).await
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::send`]; [`ClientError::Decode`] if the body has
    /// no `name`.
    pub async fn current_user(&self) -> Result<UserProfile> {
        decode("user profile", self.get("users/current").await?)
    }

    /// Sign in and store the returned tokens when the backend reports success.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn sign_in(&self, credentials: &SignInCredentials) -> Result<SignInResult> {
        let body = self
            .executor
            .send(
                &self.url("users/signin"),
                RequestOptions::post(serde_json::to_value(credentials)?),
            )
            .await?;
        let result: ActionResult = decode("sign-in response", body.clone())?;
        let stored = if result.success {
            let pair = TokenPair::from_json(&body);
            self.executor
                .store()
                .set_tokens(
                    pair.access_token.as_deref().unwrap_or(""),
                    pair.refresh_token.as_deref().unwrap_or(""),
                )
                .await
        } else {
            tracing::info!(error = ?result.error, "sign-in rejected");
            SetTokensOutcome::default()
        };
        Ok(SignInResult { result, stored })
    }

    /// Sign out; stored tokens are cleared only if the backend confirms.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn sign_out(&self) -> Result<ActionResult> {
        let body = self
            .executor
            .send(&self.url("users/signout"), RequestOptions::post(json!({})))
            .await?;
        let result: ActionResult = decode("sign-out response", body)?;
        if result.success {
            self.executor.store().clear().await;
            tracing::info!("signed out, tokens cleared");
        }
        Ok(result)
    }

    /// Usage statistics, retried per the configured policy.
    ///
    /// `Ok(None)` means the server answered with an empty body.
    ///
    /// # Errors
    ///
    /// The last error once every attempt has failed.
    pub async fn usage_statistics(&self) -> Result<Option<UsageStatistics>> {
        let url = self.url("usage/statistics");
        let body = self
            .retry
            .run(|| self.executor.send(&url, RequestOptions::get()))
            .await?;
        if body.is_null() {
            return Ok(None);
        }
        decode("usage statistics", body).map(Some)
    }

    /// Usage statistics, or all zeros if they cannot be fetched.
    pub async fn usage_statistics_or_default(&self) -> UsageStatistics {
        match self.usage_statistics().await {
            Ok(Some(stats)) => stats,
            Ok(None) => UsageStatistics::default(),
            Err(e) => {
                tracing::warn!(error = %e, "usage statistics unavailable, showing defaults");
                UsageStatistics::default()
            }
        }
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn usage_records(&self) -> Result<ListResponse<UsageRecord>> {
        let body = self.get("usage?include_user=1").await?;
        Ok(ListResponse::classify(body, &["usage"]))
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn record_usage(&self, user_id: &str, units_used: f64) -> Result<ActionResult> {
        let body = self
            .executor
            .send(
                &self.url("usage"),
                RequestOptions::post(json!({
                    "subscription_id": null,
                    "user_id": user_id,
                    "units_used": units_used,
                })),
            )
            .await?;
        decode("usage response", body)
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn users(&self) -> Result<ListResponse<Value>> {
        let body = self.get("users").await?;
        Ok(ListResponse::classify(body, &["users"]))
    }

    /// Subscription plans. The listing is public, so no token is sent and a
    /// stale session cannot fail it. A body with `"success": false` is
    /// reported as [`ListResponse::Unknown`].
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn plans(&self) -> Result<ListResponse<Plan>> {
        let body = self
            .executor
            .send_anonymous(&self.url("plans"), RequestOptions::get())
            .await?;
        if body.get("success") == Some(&Value::Bool(false)) {
            tracing::warn!("plans request unsuccessful");
            return Ok(ListResponse::Unknown(body));
        }
        Ok(ListResponse::classify(body, &["plans"]))
    }

    /// Start a Paystack checkout; the result's `redirect` is the payment page.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn initiate_payment(
        &self,
        plan_id: &str,
        email: Option<&str>,
        callback_url: &str,
    ) -> Result<ActionResult> {
        let opts = RequestOptions::post(json!({ "email": email })).header(CALLBACK_HEADER, callback_url);
        let body = self
            .executor
            .send(&self.url(&format!("payment/{plan_id}/paystack")), opts)
            .await?;
        decode("payment response", body)
    }

    /// Confirm a Paystack checkout after the payment page redirects back
    /// with `reference`.
    ///
    /// An error status from the backend is folded into a failed
    /// [`ActionResult`]; use [`ActionResult::message_or`] with
    /// [`PAYMENT_SUCCESS_MESSAGE`] and [`PAYMENT_FAILURE_MESSAGE`] for display.
    ///
    /// # Errors
    ///
    /// [`ClientError::Configuration`] for an empty reference; transport and
    /// decode failures as [`RequestExecutor::send_anonymous`].
    pub async fn verify_payment(&self, reference: &str) -> Result<ActionResult> {
        if reference.trim().is_empty() {
            return Err(ClientError::Configuration("payment reference is empty".into()));
        }
        let query = serde_urlencoded::to_string([("reference", reference)])
            .map_err(|e| ClientError::Configuration(format!("invalid payment reference: {e}")))?;
        let url = self.url(&format!("payment/callback/paystack?{query}"));
        match self.executor.send_anonymous(&url, RequestOptions::get()).await {
            Ok(body) => decode("payment verification", body),
            Err(e) => {
                let message = http_failure_message(e)?;
                tracing::warn!(reference, error = %message, "payment not verified");
                Ok(ActionResult::failure(message))
            }
        }
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<ActionResult> {
        let body = self
            .executor
            .send(
                &self.url("users/signup"),
                RequestOptions::post(serde_json::to_value(request)?),
            )
            .await?;
        decode("sign-up response", body)
    }

    /// Ask the backend to email a password reset code to `email`.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn request_password_reset(&self, email: &str) -> Result<ActionResult> {
        let body = self
            .executor
            .send(
                &self.url("users/reset-password"),
                RequestOptions::post(json!({ "email": email })),
            )
            .await?;
        decode("password reset response", body)
    }

    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn send_message(&self, message: &ContactMessage) -> Result<ActionResult> {
        let body = self
            .executor
            .send(
                &self.url("users/send-message"),
                RequestOptions::post(serde_json::to_value(message)?),
            )
            .await?;
        decode("message response", body)
    }

    /// Follow the `token` from an email verification link. Sent without
    /// credentials; a rejected token is [`EmailVerification::Failed`].
    ///
    /// # Errors
    ///
    /// [`ClientError::Configuration`] for an empty token; transport and
    /// decode failures as [`RequestExecutor::send_anonymous`].
    pub async fn verify_email(&self, token: &str) -> Result<EmailVerification> {
        if token.trim().is_empty() {
            return Err(ClientError::Configuration("verification token is empty".into()));
        }
        let url = self.url(&format!("users/verify-email/{token}"));
        match self.executor.send_anonymous(&url, RequestOptions::get()).await {
            Ok(body) => Ok(EmailVerification::from_body(&body)),
            Err(e) => Ok(EmailVerification::Failed {
                reason: http_failure_message(e)?,
            }),
        }
    }

    /// Request another verification email. Signed-in callers may omit
    /// `email`; the backend uses the account behind the token.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn resend_verification(&self, email: Option<&str>) -> Result<ActionResult> {
        let payload = email.map_or_else(|| json!({}), |email| json!({ "email": email }));
        let body = self
            .executor
            .send(
                &self.url("users/resend-verification"),
                RequestOptions::post(payload),
            )
            .await?;
        decode("resend verification response", body)
    }

    /// Whether the signed-in user's email is verified; `None` when the
    /// backend does not say.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::send`].
    pub async fn email_verified(&self) -> Result<Option<bool>> {
        let body = self.get("users/check-verification-status").await?;
        Ok(body.get("valid_email").and_then(Value::as_bool))
    }

    /// URL of the third-party sign-in page for `provider`.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::send`]; [`ClientError::Decode`] if the answer has
    /// no `redirect`.
    pub async fn authorize_url(&self, provider: &str, callback_url: &str) -> Result<String> {
        let opts = RequestOptions::get().header(CALLBACK_HEADER, callback_url);
        let body = self
            .executor
            .send(&self.url(&format!("users/authorize/{provider}")), opts)
            .await?;
        body.get("redirect")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Decode("authorization response has no redirect".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockServer;
    use std::time::Duration;
    use storefront_auth::RefreshClient;
    use storefront_store::{InMemoryKeyValueStore, TokenStore};

    fn api(server: &MockServer) -> (StorefrontApi, TokenStore) {
        let store = TokenStore::new(Arc::new(InMemoryKeyValueStore::new()));
        let http = reqwest::Client::new();
        let refresh = Arc::new(RefreshClient::new(
            http.clone(),
            server.url("users/refresh-token"),
            store.clone(),
        ));
        let exec = Arc::new(RequestExecutor::new(http, store.clone(), refresh));
        let retry = RetryPolicy::new(2, Duration::from_millis(10));
        (StorefrontApi::new(exec, server.base(), retry), store)
    }

    #[tokio::test]
    async fn test_current_user() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        store.set_tokens("good", "rt-ok").await;
        let user = api.current_user().await.unwrap();
        assert_eq!(user.name, "Ada Obi");
        assert_eq!(user.username.as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn test_sign_in_stores_tokens() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        let out = api
            .sign_in(&SignInCredentials::new("ada@simplylovely.ng", "secret").remember(true))
            .await
            .unwrap();
        assert!(out.result.success);
        assert_eq!(out.result.redirect.as_deref(), Some("/account"));
        assert!(out.stored.access_set && out.stored.refresh_set);
        assert_eq!(store.snapshot().await, TokenPair::new("good", "rt-ok"));
    }

    #[tokio::test]
    async fn test_sign_in_failure_stores_nothing() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        let out = api
            .sign_in(&SignInCredentials::new("ada@simplylovely.ng", "wrong"))
            .await
            .unwrap();
        assert!(!out.result.success);
        assert_eq!(out.result.display_message(), "Invalid credentials");
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_without_username_rejected_by_backend() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        let err = api
            .sign_in(&SignInCredentials::new("", "secret"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "All fields are required and must not be empty.");
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_clears_tokens() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        store.set_tokens("good", "rt-ok").await;
        let out = api.sign_out().await.unwrap();
        assert!(out.success);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_usage_statistics_retries_transient_failure() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        let stats = api.usage_statistics().await.unwrap().unwrap();
        assert_eq!(server.hits("statistics"), 2);
        assert_eq!(stats.units_used, 3.0);
        assert_eq!(stats.remaining_units, 7.0);
    }

    #[tokio::test]
    async fn test_usage_records_with_user() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        let records = api.usage_records().await.unwrap();
        let ListResponse::Keyed { key, items } = records else {
            panic!("expected keyed usage list");
        };
        assert_eq!(key, "usage");
        assert_eq!(items[0].units_used, 2.0);
        assert_eq!(
            items[0].user.as_ref().and_then(|u| u.username.as_deref()),
            Some("ada")
        );
    }

    #[tokio::test]
    async fn test_record_usage() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        let out = api.record_usage("7", 2.5).await.unwrap();
        assert!(out.success);
        assert_eq!(out.message.as_deref(), Some("Recorded 2.5 units"));
    }

    #[tokio::test]
    async fn test_users_keyed() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        assert_eq!(api.users().await.unwrap().into_items().len(), 2);
    }

    #[tokio::test]
    async fn test_plans_keyed_and_lenient() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        let plans = api.plans().await.unwrap().into_items();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].id, "1");
        assert_eq!(plans[1].id, "premium");
        assert_eq!(plans[1].amount, 12000.5);
    }

    #[tokio::test]
    async fn test_plans_ignore_stale_session() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        store.set_tokens("stale", "rt-revoked").await;
        let plans = api.plans().await.unwrap().into_items();
        assert_eq!(plans.len(), 2);
        assert_eq!(server.hits("plans"), 1);
        assert_eq!(server.hits("refresh"), 0);
    }

    #[tokio::test]
    async fn test_sign_up() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        let mut request = SignUpRequest {
            username: "bo".into(),
            email: "bo@x.ng".into(),
            phone: "08030000000".into(),
            password: "secret".into(),
            name: None,
        };
        let out = api.sign_up(&request).await.unwrap();
        assert!(out.success);
        assert_eq!(out.redirect.as_deref(), Some("./signin"));

        request.username = "ada".into();
        let err = api.sign_up(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "Please use a different username.");
    }

    #[tokio::test]
    async fn test_request_password_reset() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        let out = api.request_password_reset("ada@simplylovely.ng").await.unwrap();
        assert_eq!(out.display_message(), "Password reset email sent.");

        let err = api.request_password_reset("nobody@x.ng").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_send_message() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        let msg = ContactMessage {
            email: "bo@x.ng".into(),
            details: "Bulk order".into(),
            ..Default::default()
        };
        assert!(api.send_message(&msg).await.unwrap().success);

        let err = api.send_message(&ContactMessage::default()).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_verify_email_outcomes() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        store.set_tokens("good", "rt-ok").await;

        assert_eq!(
            api.verify_email("fresh").await.unwrap(),
            EmailVerification::Verified {
                message: Some("Email verified successfully.".into())
            }
        );
        assert_eq!(
            api.verify_email("used").await.unwrap(),
            EmailVerification::AlreadyVerified
        );
        assert_eq!(
            api.verify_email("bogus").await.unwrap(),
            EmailVerification::Failed {
                reason: "Invalid or expired verification link.".into()
            }
        );
        assert_eq!(server.hits("verify-email"), 3);
        assert!(matches!(
            api.verify_email(" ").await.unwrap_err(),
            ClientError::Configuration(_)
        ));
    }

    #[tokio::test]
    async fn test_resend_verification() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        let out = api.resend_verification(Some("bo@x.ng")).await.unwrap();
        assert_eq!(out.display_message(), "Verification email sent.");
        assert_eq!(api.resend_verification(None).await.unwrap_err().status(), Some(400));

        store.set_tokens("good", "rt-ok").await;
        assert!(api.resend_verification(None).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_email_verified_status() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        store.set_tokens("good", "rt-ok").await;
        assert_eq!(api.email_verified().await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_verify_payment_messages() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);

        let ok = api.verify_payment("ref 1&2").await.unwrap();
        assert!(ok.success);
        assert_eq!(
            ok.message_or(PAYMENT_SUCCESS_MESSAGE, PAYMENT_FAILURE_MESSAGE),
            "Transaction verified and subscription activated."
        );

        let quiet = api.verify_payment("ref-quiet").await.unwrap();
        assert_eq!(
            quiet.message_or(PAYMENT_SUCCESS_MESSAGE, PAYMENT_FAILURE_MESSAGE),
            PAYMENT_SUCCESS_MESSAGE
        );

        let missing = api.verify_payment("ref-unknown").await.unwrap();
        assert!(!missing.success);
        assert_eq!(
            missing.message_or(PAYMENT_SUCCESS_MESSAGE, PAYMENT_FAILURE_MESSAGE),
            "Transaction not found"
        );
    }

    #[tokio::test]
    async fn test_initiate_payment_sends_callback_header() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        let out = api
            .initiate_payment("1", Some("ada@simplylovely.ng"), "https://simplylovely.ng/account")
            .await
            .unwrap();
        assert!(out.success);
        assert_eq!(
            out.redirect.as_deref(),
            Some("https://checkout.paystack.test/1?email=ada@simplylovely.ng")
        );
    }

    #[tokio::test]
    async fn test_authorize_url() {
        let server = MockServer::start().await;
        let (api, _) = api(&server);
        let url = api
            .authorize_url("google", "http://127.0.0.1:8765/")
            .await
            .unwrap();
        assert_eq!(url, "https://accounts.google.test/auth?cb=http://127.0.0.1:8765/");
    }

    #[tokio::test]
    async fn test_get_arbitrary_path() {
        let server = MockServer::start().await;
        let (api, store) = api(&server);
        store.set_tokens("good", "rt-ok").await;
        assert_eq!(api.get("/protected").await.unwrap(), json!({"ok": true}));
    }
}
