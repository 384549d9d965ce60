//! Session guard: the entry check for protected screens.
//!
//! Runs exactly once each time the game screen is entered. The expiry check
//! is purely local (decode the identity token, compare `exp` against the
//! clock); the network is touched only when the token is confirmed expired,
//! so the common valid-session case costs zero requests.

use chrono::{DateTime, Utc};

use super::session::SessionStore;

/// Toast shown when no identity token is stored at all.
pub const MSG_UNAUTHORIZED: &str = "Unauthorized, kindly login.";

/// Toast shown when the refresh attempt fails.
pub const MSG_SESSION_EXPIRED: &str = "Session expired, kindly login again.";

/// Lifecycle of one guard pass over a protected screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Inspecting the stored identity token.
    Checking,
    /// Token valid; the protected screen may render.
    Authorized,
    /// Token expired; a refresh request is in flight. The screen renders a
    /// placeholder, never the protected content.
    Refreshing,
    /// No usable session; the user is being sent to login.
    Unauthorized,
}

/// Outcome of the local token inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardCheck {
    /// No identity token is persisted (or it is undecodable).
    NoToken,
    /// Token present with `exp` in the future.
    Valid,
    /// Token present but expired; carries what the refresh request needs.
    Expired {
        email: String,
        refresh_token: String,
    },
}

/// Inspect the stored session at `now`. Purely local: no network.
pub fn check(session: &SessionStore, now: DateTime<Utc>) -> GuardCheck {
    let claims = match session.claims() {
        Some(claims) => claims,
        None => return GuardCheck::NoToken,
    };

    if !claims.is_expired(now) {
        return GuardCheck::Valid;
    }

    // Expired: a refresh needs the decoded email plus the stored refresh
    // token. A missing refresh token is handled as no session.
    match session.tokens() {
        Ok(Some(tokens)) => GuardCheck::Expired {
            email: claims.email.clone(),
            refresh_token: tokens.refresh_token,
        },
        _ => GuardCheck::NoToken,
    }
}
