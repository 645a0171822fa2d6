//! OAuth error types.

use thiserror::Error;

use crate::http::HttpError;

/// Phrases in `error_description` that mean the grant is permanently unusable
/// even when the provider reports a different error code.
const REVOKED_PHRASES: &[&str] = &[
    "token has been expired or revoked",
    "token has been revoked",
    "refresh token is invalid",
    "account has been deleted",
];

/// Errors that can occur talking to the OAuth token endpoint.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The request never produced a response.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The request timed out.
    #[error("Token request timed out: {0}")]
    Timeout(String),

    /// Failed to parse response from the OAuth provider.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The grant was revoked, expired, or never valid. Reconnect required.
    #[error("Grant rejected: {0}")]
    InvalidGrant(String),

    /// The provider throttled the request.
    #[error("Token endpoint rate limited the request")]
    RateLimited,

    /// The provider failed on its side.
    #[error("Token endpoint returned HTTP {status}")]
    Server { status: u16 },

    /// Any other OAuth error response.
    #[error("{provider} error {code}: {message}")]
    Provider {
        provider: &'static str,
        code: String,
        message: String,
    },

    /// OAuth configuration error.
    #[error("OAuth configuration error: {0}")]
    Configuration(String),
}

impl OAuthError {
    /// Create a Google error response.
    pub fn google(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: "Google",
            code: code.into(),
            message: message.into(),
        }
    }

    /// Classify an OAuth error response body's `error` and `error_description`.
    pub fn from_error_response(code: &str, description: Option<&str>) -> Self {
        let message = description.unwrap_or(code).to_string();
        if code == "invalid_grant" || describes_revocation(&message) {
            Self::InvalidGrant(message)
        } else {
            Self::google(code, message)
        }
    }

    /// Whether the grant can never succeed again without user reauthorization.
    pub fn is_invalid_grant(&self) -> bool {
        matches!(self, Self::InvalidGrant(_))
    }
}

impl From<HttpError> for OAuthError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Timeout(msg) => Self::Timeout(msg),
            other => Self::Http(other.to_string()),
        }
    }
}

fn describes_revocation(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    REVOKED_PHRASES.iter().any(|p| lower.contains(p))
}
