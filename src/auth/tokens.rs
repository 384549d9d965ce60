//! Persisted token storage.
//!
//! All three session tokens move together: they are written as one record on
//! login, partially overwritten (identity + access) on refresh, and removed
//! as one record on logout. Centralizing that in a repository keeps the
//! invariant in one place and lets tests swap in an in-memory double.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Token file name in the cache directory.
const TOKEN_FILE: &str = "tokens.json";

/// The three opaque tokens issued at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Storage capability for the persisted session tokens.
pub trait TokenRepository {
    /// Load the stored tokens, if any.
    fn load(&self) -> Result<Option<TokenSet>>;

    /// Store a complete token set, replacing any previous one.
    fn store(&mut self, tokens: &TokenSet) -> Result<()>;

    /// Overwrite the identity and access tokens after a refresh. The refresh
    /// token is reused, not rotated. Fails if no token set is stored.
    fn store_refreshed(&mut self, id_token: &str, access_token: &str) -> Result<()>;

    /// Remove all stored tokens.
    fn clear(&mut self) -> Result<()>;
}

/// Token repository backed by a JSON file in the cache directory.
pub struct FileTokenRepository {
    cache_dir: PathBuf,
}

impl FileTokenRepository {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn token_path(&self) -> PathBuf {
        self.cache_dir.join(TOKEN_FILE)
    }
}

impl TokenRepository for FileTokenRepository {
    fn load(&self) -> Result<Option<TokenSet>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token file")?;
        let tokens: TokenSet =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(tokens))
    }

    fn store(&mut self, tokens: &TokenSet) -> Result<()> {
        let path = self.token_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(tokens)?;
        std::fs::write(path, contents).context("Failed to write token file")?;
        Ok(())
    }

    fn store_refreshed(&mut self, id_token: &str, access_token: &str) -> Result<()> {
        let mut tokens = self
            .load()?
            .context("No stored tokens to refresh")?;
        tokens.id_token = id_token.to_string();
        tokens.access_token = access_token.to_string();
        self.store(&tokens)
    }

    fn clear(&mut self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}

/// In-memory repository for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryTokenRepository {
    tokens: Option<TokenSet>,
}

#[cfg(test)]
impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenSet) -> Self {
        Self {
            tokens: Some(tokens),
        }
    }
}

#[cfg(test)]
impl TokenRepository for MemoryTokenRepository {
    fn load(&self) -> Result<Option<TokenSet>> {
        Ok(self.tokens.clone())
    }

    fn store(&mut self, tokens: &TokenSet) -> Result<()> {
        self.tokens = Some(tokens.clone());
        Ok(())
    }

    fn store_refreshed(&mut self, id_token: &str, access_token: &str) -> Result<()> {
        let tokens = self
            .tokens
            .as_mut()
            .context("No stored tokens to refresh")?;
        tokens.id_token = id_token.to_string();
        tokens.access_token = access_token.to_string();
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.tokens = None;
        Ok(())
    }
}
