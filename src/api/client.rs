//! API client for the tic-tac-toe game service.
//!
//! This module provides the `ApiClient` struct for the authentication
//! endpoints and the remote game-statistics counter. All bodies are JSON;
//! field casing follows the server's wire format via serde renames.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::auth::TokenSet;
use crate::game::Mark;

use super::ApiError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SignupResponse {
    data: Option<SignupData>,
}

#[derive(Debug, Deserialize)]
struct SignupData {
    /// Delivery-confirmation marker; its contents are not used, only its
    /// presence signals that the verification code was sent.
    #[serde(rename = "CodeDeliveryDetails")]
    code_delivery_details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthDataResponse {
    data: Option<AuthData>,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
struct AuthenticationResult {
    #[serde(rename = "IdToken")]
    id_token: Option<String>,
    #[serde(rename = "AccessToken")]
    access_token: Option<String>,
    #[serde(rename = "RefreshToken")]
    refresh_token: Option<String>,
}

/// Identity and access tokens returned by a refresh; the refresh token is
/// not rotated by the server.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub id_token: String,
    pub access_token: String,
}

/// Remote win counters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GameStats {
    #[serde(rename = "playerXWins")]
    pub player_x_wins: u64,
    #[serde(rename = "playerOWins")]
    pub player_o_wins: u64,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

// ============================================================================
// Client
// ============================================================================

/// API client for the game service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against the given base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;
        Self::check_response(response).await
    }

    /// Create an account. Returns whether the server confirmed that a
    /// verification code was delivered.
    pub async fn signup(&self, request: &SignupRequest) -> Result<bool> {
        let response = self.post_json("auth/signup", request).await?;
        let parsed: SignupResponse = response
            .json()
            .await
            .context("Failed to parse signup response")?;
        Ok(parsed
            .data
            .map(|d| d.code_delivery_details.is_some())
            .unwrap_or(false))
    }

    /// Confirm an account with the emailed 6-digit code. Returns the
    /// server's confirmation message.
    pub async fn verify(&self, email: &str, confirmation_code: &str) -> Result<String> {
        let body = json!({
            "email": email,
            "confirmationCode": confirmation_code,
        });
        let response = self.post_json("auth/verify", &body).await?;
        let parsed: MessageResponse = response
            .json()
            .await
            .context("Failed to parse verify response")?;
        parsed
            .message
            .ok_or_else(|| ApiError::InvalidResponse("Verify response had no message".into()).into())
    }

    /// Authenticate and return the full token set.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenSet> {
        let body = json!({
            "email": email,
            "password": password,
        });
        let response = self.post_json("auth/login", &body).await?;
        let parsed: AuthDataResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;

        let result = parsed
            .data
            .and_then(|d| d.authentication_result)
            .ok_or_else(|| {
                ApiError::InvalidResponse("Login response had no AuthenticationResult".into())
            })?;

        match (result.id_token, result.access_token, result.refresh_token) {
            (Some(id_token), Some(access_token), Some(refresh_token)) => Ok(TokenSet {
                id_token,
                access_token,
                refresh_token,
            }),
            _ => Err(ApiError::InvalidResponse(
                "Login response was missing one or more tokens".into(),
            )
            .into()),
        }
    }

    /// Exchange the refresh token for a new identity/access pair.
    pub async fn refresh_token(&self, email: &str, refresh_token: &str) -> Result<RefreshedTokens> {
        let body = json!({
            "email": email,
            "refreshToken": refresh_token,
        });
        let response = self.post_json("auth/refresh-token", &body).await?;
        let parsed: AuthDataResponse = response
            .json()
            .await
            .context("Failed to parse refresh response")?;

        let result = parsed
            .data
            .and_then(|d| d.authentication_result)
            .ok_or_else(|| {
                ApiError::InvalidResponse("Refresh response had no AuthenticationResult".into())
            })?;

        match (result.id_token, result.access_token) {
            (Some(id_token), Some(access_token)) => Ok(RefreshedTokens {
                id_token,
                access_token,
            }),
            _ => Err(ApiError::InvalidResponse(
                "Refresh response was missing a token".into(),
            )
            .into()),
        }
    }

    /// Invalidate the access token server-side. Returns the server's message.
    pub async fn logout(&self, access_token: &str) -> Result<String> {
        let body = json!({ "accessToken": access_token });
        let response = self.post_json("auth/logout", &body).await?;
        let parsed: MessageResponse = response
            .json()
            .await
            .context("Failed to parse logout response")?;
        Ok(parsed.message.unwrap_or_default())
    }

    /// Fetch the win counters.
    pub async fn fetch_game_stats(&self, access_token: Option<&str>) -> Result<GameStats> {
        let url = self.url("game-stats");
        debug!(%url, "GET");
        let mut request = self.client.get(&url);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .context("Failed to parse game stats response")
    }

    /// Record a win for `winner`.
    pub async fn update_game_stats(&self, winner: Mark, access_token: Option<&str>) -> Result<()> {
        let url = self.url("game-stats/update");
        debug!(%url, %winner, "POST");
        let mut request = self.client.post(&url).json(&json!({
            "winner": winner.to_string(),
        }));
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;
        Self::check_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"data":{"AuthenticationResult":{"IdToken":"id.jwt.sig","AccessToken":"acc","RefreshToken":"ref","TokenType":"Bearer","ExpiresIn":3600}}}"#;
        let parsed: AuthDataResponse = serde_json::from_str(json).unwrap();
        let result = parsed.data.unwrap().authentication_result.unwrap();
        assert_eq!(result.id_token.as_deref(), Some("id.jwt.sig"));
        assert_eq!(result.access_token.as_deref(), Some("acc"));
        assert_eq!(result.refresh_token.as_deref(), Some("ref"));
    }

    #[test]
    fn test_parse_refresh_response_without_refresh_token() {
        let json = r#"{"data":{"AuthenticationResult":{"IdToken":"id2","AccessToken":"acc2"}}}"#;
        let parsed: AuthDataResponse = serde_json::from_str(json).unwrap();
        let result = parsed.data.unwrap().authentication_result.unwrap();
        assert_eq!(result.id_token.as_deref(), Some("id2"));
        assert!(result.refresh_token.is_none());
    }

    #[test]
    fn test_parse_signup_response_delivery_marker() {
        let with_marker = r#"{"data":{"CodeDeliveryDetails":{"Destination":"a***@b.com","DeliveryMedium":"EMAIL"}}}"#;
        let parsed: SignupResponse = serde_json::from_str(with_marker).unwrap();
        assert!(parsed.data.unwrap().code_delivery_details.is_some());

        let without: SignupResponse = serde_json::from_str(r#"{"data":{}}"#).unwrap();
        assert!(without.data.unwrap().code_delivery_details.is_none());
    }

    #[test]
    fn test_parse_game_stats() {
        let stats: GameStats =
            serde_json::from_str(r#"{"playerXWins":3,"playerOWins":7}"#).unwrap();
        assert_eq!(stats.player_x_wins, 3);
        assert_eq!(stats.player_o_wins, 7);
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let client = ApiClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.url("auth/login"), "http://localhost:3001/auth/login");

        let client = ApiClient::new("http://localhost:3001").unwrap();
        assert_eq!(client.url("game-stats"), "http://localhost:3001/game-stats");
    }
}
