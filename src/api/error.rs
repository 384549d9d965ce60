use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Fallback message when the server body carries nothing usable.
const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong!";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Shape of the server's error bodies; both fields are optional in practice.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Extract a user-facing message from an error body, falling back
    /// through: server `error` field, server `message` field, default.
    fn message_from_body(body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(error) = parsed.error.filter(|s| !s.is_empty()) {
                return Self::truncate_body(&error);
            }
            if let Some(message) = parsed.message.filter(|s| !s.is_empty()) {
                return Self::truncate_body(&message);
            }
        }
        DEFAULT_ERROR_MESSAGE.to_string()
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::message_from_body(body);
        match status.as_u16() {
            401 | 403 => ApiError::Unauthorized(message),
            400..=499 => ApiError::BadRequest(message),
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// The message to surface in a toast.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(m) | ApiError::BadRequest(m) | ApiError::ServerError(m) => {
                m.clone()
            }
            ApiError::NetworkError(_) | ApiError::InvalidResponse(_) => {
                DEFAULT_ERROR_MESSAGE.to_string()
            }
        }
    }
}
