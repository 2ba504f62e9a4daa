//! Typed request and response bodies for the storefront endpoints.
//!
//! The backend is loose about numbers (units arrive as `2` or `"2"`), so
//! numeric fields accept either and default to zero.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use storefront_types::SetTokensOutcome;

fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// `GET users/current`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Upper-cased first letter of the name, for avatar placeholders.
    #[must_use]
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next().map(|c| c.to_ascii_uppercase())
    }
}

/// `POST users/signin`. The backend matches `username` against the
/// username, email and phone columns.
#[derive(Debug, Clone, Serialize)]
pub struct SignInCredentials {
    pub username: String,
    pub password: String,
    pub remember: bool,
}

impl SignInCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember: false,
        }
    }

    #[must_use]
    pub fn remember(mut self, remember: bool) -> Self {
        self.remember = remember;
        self
    }
}

/// `POST users/signup`. All four required fields must be non-empty.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `POST users/send-message`, the contact form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactMessage {
    pub email: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<u64>,
}

/// The `{success, message, error, redirect}` envelope most write
/// endpoints answer with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ActionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
}

impl ActionResult {
    /// A failed result carrying `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The message to show a user: `message` on success, `error` otherwise.
    #[must_use]
    pub fn display_message(&self) -> &str {
        self.message_or("Operation successful.", "Operation failed.")
    }

    /// Like [`display_message`](Self::display_message) with caller-chosen
    /// fallbacks.
    #[must_use]
    pub fn message_or<'a>(&'a self, on_success: &'a str, on_failure: &'a str) -> &'a str {
        let (primary, fallback) = if self.success {
            (&self.message, on_success)
        } else {
            (&self.error, on_failure)
        };
        primary.as_deref().unwrap_or(fallback)
    }
}

/// Result of following an email verification link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailVerification {
    Verified { message: Option<String> },
    AlreadyVerified,
    Failed { reason: String },
}

impl EmailVerification {
    /// Classify a `users/verify-email/{token}` body.
    #[must_use]
    pub fn from_body(body: &Value) -> Self {
        if body.get("success") != Some(&Value::Bool(true)) {
            let reason = body
                .get("error")
                .and_then(Value::as_str)
                .filter(|e| !e.is_empty())
                .unwrap_or("Verification failed. Please try again.");
            return Self::Failed {
                reason: reason.to_string(),
            };
        }
        if body.pointer("/data/already_verified") == Some(&Value::Bool(true)) {
            return Self::AlreadyVerified;
        }
        Self::Verified {
            message: body.get("message").and_then(Value::as_str).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    pub result: ActionResult,
    /// Which tokens from the response were stored. All `false` on failure.
    pub stored: SetTokensOutcome,
}

/// `GET usage/statistics`. [`Default`] is the all-zero display fallback.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UsageStatistics {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub units_used: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_units: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub remaining_units: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usage_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UsageUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One row of `GET usage?include_user=1`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UsageRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub units_used: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_units: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub remaining_units: f64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user: Option<UsageUser>,
}

/// One entry of `GET plans`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default)]
    pub units: Option<Value>,
}
