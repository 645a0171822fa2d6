//! OAuth token handling for connected channels.
//!
//! - [`OAuthError`] classifies token endpoint failures into revoked grants
//!   (terminal) and everything else (transient).
//! - [`GoogleOAuthClient`] performs the authorization-code exchange and the
//!   refresh grant against Google's token endpoint.
//! - [`TokenRefresher`] is the seam the credential manager depends on.

mod error;
mod google;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

pub use error::OAuthError;
pub use google::{DEFAULT_TOKEN_URL, GoogleOAuthClient};

/// Tokens granted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenGrant {
    pub access_token: String,

    /// Lifetime of `access_token` in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Present on the initial exchange, and on refresh only when rotated.
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,

    #[serde(default)]
    pub token_type: Option<String>,
}

/// Source of fresh access tokens.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, OAuthError>;

    /// Exchange an authorization code for the initial token pair.
    async fn exchange_code(&self, code: &str, redirect_uri: &str)
    -> Result<TokenGrant, OAuthError>;
}

/// Check if a token has expired (or will expire within `buffer_secs`).
///
/// Returns `true` if `expires_at` is `None`: a token without a known expiry is
/// refreshed rather than trusted.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use tubeplate::oauth::token_is_expired;
///
/// let expires_at = (Utc::now() + Duration::minutes(10)).fixed_offset();
///
/// assert!(!token_is_expired(Some(expires_at), 300)); // Still valid
/// assert!(token_is_expired(Some(expires_at), 700)); // Within buffer
/// ```
pub fn token_is_expired(expires_at: Option<DateTime<FixedOffset>>, buffer_secs: i64) -> bool {
    match expires_at {
        Some(exp) => Utc::now() + Duration::seconds(buffer_secs) >= exp,
        None => true,
    }
}

/// Compute the absolute expiry of a grant issued at `issued_at`.
///
/// Returns `None` when the provider did not report a lifetime.
pub fn compute_expires_at(
    issued_at: DateTime<Utc>,
    expires_in: Option<i64>,
) -> Option<DateTime<FixedOffset>> {
    expires_in.map(|secs| (issued_at + Duration::seconds(secs)).fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_expired_no_expiry() {
        assert!(token_is_expired(None, 0));
        assert!(token_is_expired(None, 300));
    }

    #[test]
    fn test_token_is_expired_past() {
        let past = (Utc::now() - Duration::hours(1)).fixed_offset();
        assert!(token_is_expired(Some(past), 0));
    }

    #[test]
    fn test_token_is_expired_future() {
        let future = (Utc::now() + Duration::days(1)).fixed_offset();
        assert!(!token_is_expired(Some(future), 0));
        assert!(!token_is_expired(Some(future), 300));
    }

    #[test]
    fn test_token_is_expired_within_buffer() {
        let soon = (Utc::now() + Duration::seconds(60)).fixed_offset();
        assert!(token_is_expired(Some(soon), 300));
    }

    #[test]
    fn test_compute_expires_at() {
        let issued = Utc::now();
        assert_eq!(
            compute_expires_at(issued, Some(3599)),
            Some((issued + Duration::seconds(3599)).fixed_offset())
        );
        assert_eq!(compute_expires_at(issued, None), None);
    }

    #[test]
    fn test_token_grant_deserialize_google_refresh_response() {
        let json = r#"{
            "access_token": "ya29.a0AfH6SM",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/youtube.force-ssl",
            "token_type": "Bearer"
        }"#;
        let grant: TokenGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.access_token, "ya29.a0AfH6SM");
        assert_eq!(grant.expires_in, Some(3599));
        assert_eq!(grant.refresh_token, None);
        assert_eq!(grant.token_type.as_deref(), Some("Bearer"));
    }
}
