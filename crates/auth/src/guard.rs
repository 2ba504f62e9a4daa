//! Role-based access checks against the current access token.
//!
//! These decide what a page controller should do (render, send the user to
//! sign in, or show an "insufficient privileges" notice). They never grant
//! anything server-side.

use crate::inspector;
use storefront_store::TokenStore;

/// `true` if every role in `required` appears in `user_roles`.
///
/// An empty `required` list is always satisfied.
#[must_use]
pub fn has_required_roles<S: AsRef<str>>(user_roles: &[S], required: &[&str]) -> bool {
    required
        .iter()
        .all(|role| user_roles.iter().any(|r| r.as_ref() == *role))
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    /// No token, or the token is malformed or expired.
    Unauthenticated,
    /// Authenticated, but lacking the listed roles.
    Forbidden { missing: Vec<String> },
}

/// Checks the stored access token against a set of required roles.
pub struct AccessGuard {
    store: TokenStore,
}

impl AccessGuard {
    #[must_use]
    pub fn new(store: TokenStore) -> Self {
        Self { store }
    }

    /// Decide access for an explicit token.
    #[must_use]
    pub fn check_token(token: Option<&str>, required: &[&str]) -> AccessDecision {
        let Some(token) = token.filter(|t| inspector::is_valid(t)) else {
            return AccessDecision::Unauthenticated;
        };
        let roles = inspector::roles_of(token);
        let missing: Vec<String> = required
            .iter()
            .filter(|role| !roles.iter().any(|r| r == *role))
            .map(|role| (*role).to_string())
            .collect();
        if missing.is_empty() {
            AccessDecision::Granted
        } else {
            AccessDecision::Forbidden { missing }
        }
    }

    /// Decide access for the currently stored access token.
    pub async fn check(&self, required: &[&str]) -> AccessDecision {
        let token = self.store.get_access_token().await;
        let decision = Self::check_token(token.as_deref(), required);
        tracing::debug!(?decision, ?required, "access check");
        decision
    }

    /// `true` if a valid access token is stored.
    pub async fn is_authenticated(&self) -> bool {
        self.store
            .get_access_token()
            .await
            .is_some_and(|t| inspector::is_valid(&t))
    }

    /// Roles carried by the stored access token.
    pub async fn current_roles(&self) -> Vec<String> {
        self.store
            .get_access_token()
            .await
            .map(|t| inspector::roles_of(&t))
            .unwrap_or_default()
    }
}
