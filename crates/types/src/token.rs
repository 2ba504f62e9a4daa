//! Token pair representation and decoded claim access.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed storage key for the access token (persistent store and cookie).
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Fixed storage key for the refresh token (persistent store only).
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Access and refresh token as held by the token store.
///
/// Either half may be absent: a refresh response is allowed to carry only a
/// new access token, and a cookie-only session has no refresh token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// Create a pair holding both tokens.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Pick the string-valued `access_token` / `refresh_token` fields out of
    /// an arbitrary JSON body. Non-string and blank values are ignored.
    #[must_use]
    pub fn from_json(body: &Value) -> Self {
        let pick = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };
        Self {
            access_token: pick(ACCESS_TOKEN_KEY),
            refresh_token: pick(REFRESH_TOKEN_KEY),
        }
    }

    /// Returns `true` if neither token is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Per-field result of writing a token pair.
///
/// A `false` field means the value was rejected (blank) or the backing
/// store refused the write; the caller can detect partial failure without
/// an error being raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SetTokensOutcome {
    pub access_set: bool,
    pub refresh_set: bool,
}

/// Claims decoded from a token payload.
///
/// The payload is kept as a raw JSON object so that unknown claims survive;
/// typed accessors cover the claims the client consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Wrap a decoded payload. Returns `None` unless the payload is a JSON object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Expiry as epoch seconds, if the `exp` claim is numeric.
    #[must_use]
    pub fn exp(&self) -> Option<f64> {
        self.0.get("exp").and_then(Value::as_f64)
    }

    /// The `roles` claim; empty when absent or not a sequence.
    ///
    /// Non-string entries are skipped.
    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        self.0
            .get("roles")
            .and_then(Value::as_array)
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// Raw access to any claim.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}
