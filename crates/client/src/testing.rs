//! In-process storefront API for tests.
//!
//! Accepts `Bearer good` as the only valid access token. The refresh
//! endpoint trades `rt-ok` for a new pair, `rt-partial` for an access token
//! only, and rejects anything else. Public routes (`plans`, email
//! verification) answer 401 to any request carrying a bearer token.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Hits = Arc<Mutex<HashMap<String, usize>>>;

pub(crate) struct MockServer {
    base: String,
    hits: Hits,
}

impl MockServer {
    pub(crate) async fn start() -> Self {
        let hits: Hits = Arc::default();
        let app = Router::new()
            .route("/api/users/refresh-token", post(refresh))
            .route("/api/protected", get(protected))
            .route("/api/always-401", get(always_401))
            .route("/api/forbidden", get(forbidden))
            .route("/api/broken", get(broken))
            .route("/api/empty", get(empty))
            .route("/api/plain-text", get(plain_text))
            .route("/api/echo", any(echo))
            .route("/api/users/current", get(current_user))
            .route("/api/users/signin", post(sign_in))
            .route("/api/users/signout", post(sign_out))
            .route("/api/users/signup", post(sign_up))
            .route("/api/users/reset-password", post(reset_password))
            .route("/api/users/send-message", post(send_message))
            .route("/api/users/verify-email/{token}", get(verify_email))
            .route("/api/users/resend-verification", post(resend_verification))
            .route("/api/users/check-verification-status", get(verification_status))
            .route("/api/users", get(users))
            .route("/api/users/authorize/{provider}", get(authorize))
            .route("/api/usage/statistics", get(statistics))
            .route("/api/usage", get(usage_records).post(record_usage))
            .route("/api/plans", get(plans))
            .route("/api/payment/{plan_id}/paystack", post(paystack))
            .route("/api/payment/callback/paystack", get(paystack_callback))
            .with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base: format!("http://{addr}/api"),
            hits,
        }
    }

    pub(crate) fn base(&self) -> &str {
        &self.base
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    pub(crate) fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }
}

fn bump(hits: &Hits, route: &str) -> usize {
    let mut hits = hits.lock().unwrap();
    let n = hits.entry(route.to_string()).or_default();
    *n += 1;
    *n
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some("Bearer good")
}

fn expired() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Token has expired"})),
    )
        .into_response()
}

async fn refresh(State(hits): State<Hits>, Json(body): Json<Value>) -> Response {
    bump(&hits, "refresh");
    match body["refresh_token"].as_str() {
        Some("rt-ok") => Json(json!({"access_token": "good", "refresh_token": "rt-ok-2"})).into_response(),
        Some("rt-partial") => Json(json!({"access_token": "good"})).into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid refresh token"})),
        )
            .into_response(),
    }
}

async fn protected(State(hits): State<Hits>, headers: HeaderMap) -> Response {
    bump(&hits, "protected");
    if authorized(&headers) {
        Json(json!({"ok": true})).into_response()
    } else {
        expired()
    }
}

async fn always_401(State(hits): State<Hits>) -> Response {
    bump(&hits, "always-401");
    expired()
}

async fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": "Insufficient privileges"})),
    )
        .into_response()
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn plain_text() -> &'static str {
    "hello"
}

async fn echo(headers: HeaderMap, body: String) -> Json<Value> {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map_or(Value::Null, |s| Value::String(s.to_string()))
    };
    Json(json!({
        "authorization": header_str("authorization"),
        "content_type": header_str("content-type"),
        "x_custom": header_str("x-custom"),
        "body": serde_json::from_str::<Value>(&body).unwrap_or(Value::Null),
    }))
}

async fn current_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return expired();
    }
    Json(json!({"name": "Ada Obi", "username": "ada", "email": "ada@simplylovely.ng", "id": 7}))
        .into_response()
}

fn failure(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({"success": false, "error": error}))).into_response()
}

fn non_empty(body: &Value, keys: &[&str]) -> bool {
    keys.iter()
        .all(|k| body[*k].as_str().is_some_and(|v| !v.is_empty()))
}

async fn sign_in(Json(body): Json<Value>) -> Response {
    if !non_empty(&body, &["username", "password"]) {
        return failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "All fields are required and must not be empty.",
        );
    }
    if body["username"] == "ada@simplylovely.ng" && body["password"] == "secret" {
        Json(json!({
            "success": true,
            "message": "Signed in",
            "access_token": "good",
            "refresh_token": "rt-ok",
            "redirect": "/account",
        }))
        .into_response()
    } else {
        Json(json!({"success": false, "error": "Invalid credentials"})).into_response()
    }
}

async fn sign_up(Json(body): Json<Value>) -> Response {
    if !non_empty(&body, &["username", "phone", "email", "password"]) {
        return failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Must provide ('username', 'phone', 'email', 'password')",
        );
    }
    if body["username"] == "ada" {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Please use a different username.");
    }
    Json(json!({
        "success": true,
        "message": "Sign up successful.",
        "username": body["username"],
        "redirect": "./signin",
    }))
    .into_response()
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or("");
    if email != "ada@simplylovely.ng" {
        return failure(
            StatusCode::NOT_FOUND,
            &format!("No user found with the provided email <{email}>."),
        );
    }
    Json(json!({"success": true, "message": "Password reset email sent.", "token": "reset-1"}))
        .into_response()
}

async fn send_message(Json(body): Json<Value>) -> Response {
    if !non_empty(&body, &["email", "details"]) {
        return failure(StatusCode::BAD_REQUEST, "Email and details are required.");
    }
    Json(json!({"success": true, "message": "Message received."})).into_response()
}

async fn verify_email(State(hits): State<Hits>, Path(token): Path<String>, headers: HeaderMap) -> Response {
    bump(&hits, "verify-email");
    if headers.contains_key(header::AUTHORIZATION) {
        return expired();
    }
    match token.as_str() {
        "fresh" => Json(json!({"success": true, "message": "Email verified successfully."})).into_response(),
        "used" => Json(json!({"success": true, "message": "Already verified.", "data": {"already_verified": true}}))
            .into_response(),
        _ => failure(StatusCode::BAD_REQUEST, "Invalid or expired verification link."),
    }
}

async fn resend_verification(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) && !non_empty(&body, &["email"]) {
        return failure(StatusCode::BAD_REQUEST, "Email is required.");
    }
    Json(json!({"success": true, "message": "Verification email sent."})).into_response()
}

async fn verification_status(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return expired();
    }
    Json(json!({"valid_email": false})).into_response()
}

async fn sign_out(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return expired();
    }
    Json(json!({"success": true, "message": "Signed out", "redirect": "/signin"})).into_response()
}

async fn users() -> Json<Value> {
    Json(json!({"success": true, "users": [{"id": 1, "username": "ada"}, {"id": 2, "email": "bo@x.ng"}]}))
}

async fn authorize(Path(provider): Path<String>, headers: HeaderMap) -> Response {
    let Some(cb) = headers.get("client-callback-url").and_then(|v| v.to_str().ok()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing callback URL"})),
        )
            .into_response();
    };
    Json(json!({"redirect": format!("https://accounts.{provider}.test/auth?cb={cb}")})).into_response()
}

async fn statistics(State(hits): State<Hits>) -> Response {
    if bump(&hits, "statistics") == 1 {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "warming up"})),
        )
            .into_response();
    }
    Json(json!({"units_used": 3, "total_units": 10, "remaining_units": "7", "usage_percentage": 30.0}))
        .into_response()
}

async fn usage_records(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let user = if query.get("include_user").map(String::as_str) == Some("1") {
        json!({"username": "ada"})
    } else {
        Value::Null
    };
    Json(json!({"usage": [{
        "id": 11,
        "status": "completed",
        "units_used": "2",
        "total_units": 10,
        "remaining_units": 8,
        "created_at": "2025-02-26T21:15:57Z",
        "user": user,
    }]}))
}

async fn record_usage(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"success": true, "message": format!("Recorded {} units", body["units_used"])}))
}

async fn plans(State(hits): State<Hits>, headers: HeaderMap) -> Response {
    bump(&hits, "plans");
    if headers.contains_key(header::AUTHORIZATION) {
        return expired();
    }
    Json(json!({"success": true, "plans": [
        {"id": 1, "name": "Basic", "amount": 5000, "units": 10},
        {"id": "premium", "name": "Premium", "amount": "12000.50", "units": 30},
    ]}))
    .into_response()
}

async fn paystack(
    Path(plan_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let cb = headers
        .get("client-callback-url")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if cb.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing callback URL"})),
        )
            .into_response();
    }
    Json(json!({
        "success": true,
        "redirect": format!("https://checkout.paystack.test/{plan_id}?email={}", body["email"].as_str().unwrap_or("")),
    }))
    .into_response()
}

async fn paystack_callback(Query(query): Query<HashMap<String, String>>) -> Response {
    match query.get("reference").map(String::as_str) {
        Some("ref 1&2") => Json(json!({
            "success": true,
            "message": "Transaction verified and subscription activated.",
        }))
        .into_response(),
        Some("ref-quiet") => Json(json!({"success": true})).into_response(),
        _ => failure(StatusCode::NOT_FOUND, "Transaction not found"),
    }
}
