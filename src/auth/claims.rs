//! Claims decoded from the identity token.
//!
//! The token is a JWT whose payload carries `email`, `name`, and `exp`
//! (seconds since epoch). Decoding here skips signature verification: the
//! claims feed the local expiry check and the greeting line, never an
//! authorization decision.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaims {
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Expiry, seconds since the unix epoch.
    pub exp: i64,
}

impl IdentityClaims {
    /// Decode claims from a JWT without verifying its signature.
    pub fn decode(token: &str) -> Result<Self> {
        let payload = token
            .split('.')
            .nth(1)
            .context("Identity token is not a JWT")?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .context("Failed to base64-decode identity token payload")?;
        serde_json::from_slice(&bytes).context("Failed to parse identity token claims")
    }

    /// Whether the token was expired at `now`. `exp` has second resolution.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp * 1000 <= now.timestamp_millis()
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use serde_json::json;

    /// Build an unsigned JWT carrying the given claims, for tests only.
    pub(crate) fn unsigned_token(email: &str, name: &str, exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(json!({"alg": "none", "typ": "JWT"}).to_string());
        let payload =
            URL_SAFE_NO_PAD.encode(json!({"email": email, "name": name, "exp": exp}).to_string());
        format!("{}.{}.sig", header, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::unsigned_token;
    use super::*;
    use base64::Engine as _;
    use chrono::Duration;

    #[test]
    fn test_decode_reads_claims_from_payload() {
        let token = unsigned_token("a@b.com", "Ada", 1_700_000_000);
        let claims = IdentityClaims::decode(&token).unwrap();
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.name, "Ada");
        assert_eq!(claims.exp, 1_700_000_000);
    }

    #[test]
    fn test_decode_rejects_non_jwt() {
        assert!(IdentityClaims::decode("not-a-token").is_err());
        assert!(IdentityClaims::decode("").is_err());
    }

    #[test]
    fn test_decode_rejects_garbage_payload() {
        assert!(IdentityClaims::decode("aGVhZGVy.!!!not-base64!!!.sig").is_err());
    }

    #[test]
    fn test_decode_accepts_extra_claims() {
        let payload = URL_SAFE_NO_PAD.encode(
            r#"{"email":"a@b.com","name":"Ada","exp":123,"sub":"abc","iat":100}"#,
        );
        let token = format!("h.{}.s", payload);
        let claims = IdentityClaims::decode(&token).unwrap();
        assert_eq!(claims.exp, 123);
    }

    #[test]
    fn test_missing_name_defaults_to_empty() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"email":"a@b.com","exp":123}"#);
        let claims = IdentityClaims::decode(&format!("h.{}.s", payload)).unwrap();
        assert_eq!(claims.name, "");
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let future = unsigned_token("a@b.com", "Ada", (now + Duration::hours(1)).timestamp());
        let past = unsigned_token("a@b.com", "Ada", (now - Duration::hours(1)).timestamp());

        assert!(!IdentityClaims::decode(&future).unwrap().is_expired(now));
        assert!(IdentityClaims::decode(&past).unwrap().is_expired(now));
    }

    #[test]
    fn test_exp_exactly_now_counts_as_expired() {
        let now = Utc::now();
        let token = unsigned_token("a@b.com", "Ada", now.timestamp());
        let claims = IdentityClaims::decode(&token).unwrap();
        // exp has second resolution; compare at the same instant
        let at_exp = DateTime::from_timestamp(claims.exp, 0).unwrap();
        assert!(claims.is_expired(at_exp));
    }
}
