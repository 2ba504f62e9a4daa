//! Token inspection, role checks, OAuth callback handling and token refresh.
//!
//! [`inspector`] decodes token payloads without verifying signatures; it is
//! a convenience for the client, never an authorization decision. The
//! [`RefreshClient`] exchanges the stored refresh token for new tokens and
//! coalesces concurrent refreshes.

pub mod callback;
pub mod guard;
pub mod inspector;
pub mod refresh;

pub use callback::{CallbackOutcome, OAuthCallback, accept_callback, bind_callback};
pub use guard::{AccessDecision, AccessGuard, has_required_roles};
pub use refresh::RefreshClient;
