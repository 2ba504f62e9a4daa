//! Bearer token payload decoding and expiry checks.
//!
//! Tokens are three dot-separated base64url segments. Only the middle
//! (payload) segment is read, and the signature is never verified: the
//! result is advisory, real authorization happens server-side.
//!
//! Nothing here panics or returns an error. A malformed token decodes to
//! `None` and is never valid.

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use storefront_types::Claims;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// base64url, padded or not.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Standard alphabet, for issuers that emit `+` and `/` in payloads.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Decode the payload segment of `token`.
///
/// Returns `None` if the token is empty, does not have exactly three
/// segments, the payload is not base64, or it does not decode to a JSON
/// object.
#[must_use]
pub fn decode_payload(token: &str) -> Option<Claims> {
    if token.is_empty() {
        return None;
    }
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!("token does not have three segments");
        return None;
    };

    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .map_err(|e| tracing::debug!(error = %e, "token payload is not base64"))
        .ok()?;
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| tracing::debug!(error = %e, "token payload is not JSON"))
        .ok()?;
    Claims::from_value(value)
}

/// Current time as whole epoch seconds.
#[must_use]
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// `true` iff `token` decodes and its `exp` is strictly after now.
#[must_use]
pub fn is_valid(token: &str) -> bool {
    is_valid_at(token, now_epoch_secs())
}

/// `true` iff `token` decodes and its `exp` is strictly after `now`.
///
/// A token without a numeric `exp` claim is never valid.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn is_valid_at(token: &str, now: u64) -> bool {
    decode_payload(token)
        .and_then(|claims| claims.exp())
        .is_some_and(|exp| exp > now as f64)
}

/// The token's `roles` claim, or an empty list.
#[must_use]
pub fn roles_of(token: &str) -> Vec<String> {
    decode_payload(token)
        .map(|claims| claims.roles())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
    use serde_json::{Value, json};

    /// Build an unsigned three-segment token around `payload`.
    pub(crate) fn make_token(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_decode_roundtrip_claims() {
        let token = make_token(&json!({"exp": 9_999_999_999_u64, "roles": ["admin"], "sub": "paul"}));
        let claims = decode_payload(&token).unwrap();
        assert_eq!(claims.subject(), Some("paul"));
        assert_eq!(claims.roles(), vec!["admin"]);
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        assert!(decode_payload("").is_none());
        assert!(decode_payload("no-dots-at-all").is_none());
        assert!(decode_payload("a.b").is_none());
        assert!(decode_payload("a.b.c.d").is_none());
        assert!(decode_payload("header.!!!not-base64!!!.sig").is_none());
        assert!(decode_payload("header..sig").is_none());
    }

    #[test]
    fn test_decode_rejects_non_object_payload() {
        let body = URL_SAFE_NO_PAD.encode("[1,2,3]");
        assert!(decode_payload(&format!("h.{body}.s")).is_none());
        let body = URL_SAFE_NO_PAD.encode("not json");
        assert!(decode_payload(&format!("h.{body}.s")).is_none());
    }

    #[test]
    fn test_decode_accepts_padded_standard_base64() {
        let body = STANDARD.encode(json!({"exp": 1, "name": "Mr Paul?>"}).to_string());
        let claims = decode_payload(&format!("h.{body}.s")).unwrap();
        assert_eq!(claims.exp(), Some(1.0));
    }

    #[test]
    fn test_missing_exp_is_invalid() {
        let token = make_token(&json!({"roles": ["admin"]}));
        assert!(!is_valid(&token));
    }

    #[test]
    fn test_non_numeric_exp_is_invalid() {
        let token = make_token(&json!({"exp": "9999999999"}));
        assert!(!is_valid(&token));
    }

    #[test]
    fn test_past_exp_is_invalid() {
        let token = make_token(&json!({"exp": now_epoch_secs() - 1}));
        assert!(!is_valid(&token));
    }

    #[test]
    fn test_exp_boundary() {
        let now = 1_740_602_157;
        assert!(!is_valid_at(&make_token(&json!({"exp": now})), now));
        assert!(is_valid_at(&make_token(&json!({"exp": now + 1})), now));
    }

    #[test]
    fn test_future_exp_with_admin_role() {
        let token = make_token(&json!({"exp": 9_999_999_999_u64, "roles": ["admin"]}));
        assert!(is_valid(&token));
        assert_eq!(roles_of(&token), vec!["admin"]);
    }

    #[test]
    fn test_roles_default_empty() {
        assert!(roles_of(&make_token(&json!({"exp": 1}))).is_empty());
        assert!(roles_of("garbage").is_empty());
        assert!(roles_of("").is_empty());
    }

    #[test]
    fn test_empty_token_invalid() {
        assert!(!is_valid(""));
    }
}
