//! Session state: the single writer over the token repository.
//!
//! Only the login, verify-login, refresh, and logout flows mutate the
//! session; everything else reads. The in-memory claims are always derived
//! from the persisted identity token and are rebuilt from it on startup;
//! if they were ever to diverge, the token wins.

use anyhow::Result;
use tracing::{debug, warn};

use super::claims::IdentityClaims;
use super::tokens::{TokenRepository, TokenSet};

pub struct SessionStore {
    repository: Box<dyn TokenRepository>,
    claims: Option<IdentityClaims>,
}

impl SessionStore {
    /// Create a store and rebuild the in-memory claims from whatever tokens
    /// the repository holds. A corrupt or undecodable identity token is
    /// treated as no session.
    pub fn new(repository: Box<dyn TokenRepository>) -> Self {
        let mut store = Self {
            repository,
            claims: None,
        };
        match store.repository.load() {
            Ok(Some(tokens)) => match IdentityClaims::decode(&tokens.id_token) {
                Ok(claims) => {
                    debug!(email = %claims.email, "Restored session from disk");
                    store.claims = Some(claims);
                }
                Err(e) => warn!(error = %e, "Stored identity token is not decodable"),
            },
            Ok(None) => debug!("No persisted session"),
            Err(e) => warn!(error = %e, "Failed to load persisted session"),
        }
        store
    }

    /// Persist a full token set and derive the claims from it. Used by the
    /// login flow (including the automatic login after verification).
    pub fn establish(&mut self, tokens: TokenSet) -> Result<IdentityClaims> {
        let claims = IdentityClaims::decode(&tokens.id_token)?;
        self.repository.store(&tokens)?;
        self.claims = Some(claims.clone());
        Ok(claims)
    }

    /// Persist refreshed identity and access tokens (the refresh token is
    /// reused) and re-derive the claims. Used by the session guard.
    pub fn apply_refresh(&mut self, id_token: &str, access_token: &str) -> Result<IdentityClaims> {
        let claims = IdentityClaims::decode(id_token)?;
        self.repository.store_refreshed(id_token, access_token)?;
        self.claims = Some(claims.clone());
        Ok(claims)
    }

    /// Drop all tokens and claims. Used by the logout flow.
    pub fn clear(&mut self) -> Result<()> {
        self.claims = None;
        self.repository.clear()
    }

    /// Decoded claims of the current session, if any.
    pub fn claims(&self) -> Option<&IdentityClaims> {
        self.claims.as_ref()
    }

    /// The persisted tokens, if any.
    pub fn tokens(&self) -> Result<Option<TokenSet>> {
        self.repository.load()
    }

    /// The access token, for bearer-authenticated requests.
    pub fn access_token(&self) -> Option<String> {
        self.repository
            .load()
            .ok()
            .flatten()
            .map(|t| t.access_token)
    }
}
