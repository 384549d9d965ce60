//! Authentication module: session tokens, claims, and the session guard.
//!
//! This module provides:
//! - `TokenRepository` / `FileTokenRepository`: persisted token storage
//! - `SessionStore`: the single writer over the token repository
//! - `IdentityClaims`: claims decoded from the identity token
//! - `guard`: the protected-screen entry check
//!
//! The identity token's payload is decoded locally without verifying its
//! signature. That is fine for expiry checks and greeting text, and nothing
//! more: authorization is enforced by the server on every request.

pub mod claims;
pub mod guard;
pub mod session;
pub mod tokens;

pub use claims::IdentityClaims;
pub use session::SessionStore;
pub use tokens::{FileTokenRepository, TokenRepository, TokenSet};
