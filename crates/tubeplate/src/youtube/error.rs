//! Error types for YouTube Data API operations.

use chrono::Utc;
use thiserror::Error;

use crate::http::HttpError;
use crate::platform::PlatformError;

/// Error reasons YouTube reports (with HTTP 403) when throttling.
const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

/// Errors that can occur when interacting with the YouTube Data API.
#[derive(Debug, Error)]
pub enum YouTubeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    /// A field the endpoint always returns was missing.
    #[error("Response missing required field `{0}`")]
    MissingField(&'static str),

    /// The requested video is not visible to the token's channel.
    #[error("Video not found: {0}")]
    VideoNotFound(String),

    /// The authenticated user has no channel.
    #[error("No channel for the authenticated user")]
    NoChannel,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl YouTubeError {
    fn is_rate_limit(&self) -> bool {
        match self {
            Self::Api { status: 429, .. } => true,
            Self::Api {
                status: 403,
                reason: Some(reason),
                ..
            } => RATE_LIMIT_REASONS.contains(&reason.as_str()),
            _ => false,
        }
    }
}

impl From<YouTubeError> for PlatformError {
    fn from(err: YouTubeError) -> Self {
        if err.is_rate_limit() {
            return PlatformError::RateLimited {
                reset_at: Utc::now() + chrono::Duration::minutes(1),
            };
        }
        match err {
            YouTubeError::Http(HttpError::Timeout(message)) => PlatformError::Timeout { message },
            YouTubeError::Http(e) => PlatformError::network(e.to_string()),
            YouTubeError::Json(e) => PlatformError::invalid_response(format!("JSON: {e}")),
            YouTubeError::Api {
                status: 401, ..
            } => PlatformError::AuthRequired,
            YouTubeError::Api {
                status: 404,
                message,
                ..
            } => PlatformError::not_found(message),
            YouTubeError::Api {
                status, message, ..
            } => PlatformError::api(status, message),
            YouTubeError::MissingField(field) => {
                PlatformError::invalid_response(format!("missing `{field}`"))
            }
            YouTubeError::VideoNotFound(id) => PlatformError::not_found(format!("video {id}")),
            YouTubeError::NoChannel => PlatformError::not_found("channel for token"),
            YouTubeError::Config(msg) => PlatformError::internal(msg),
        }
    }
}

/// Get a short error message suitable for display.
pub fn short_error_message(err: &YouTubeError) -> String {
    match err {
        YouTubeError::Http(HttpError::Timeout(_)) => "Timed out".to_string(),
        YouTubeError::Http(_) => "Network error".to_string(),
        YouTubeError::Json(_) => "JSON parse error".to_string(),
        YouTubeError::Api {
            status,
            reason: Some(reason),
            ..
        } => format!("HTTP {status}: {reason}"),
        YouTubeError::Api {
            status, message, ..
        } => {
            if message.chars().count() > 50 {
                let truncated: String = message.chars().take(47).collect();
                format!("HTTP {status}: {truncated}...")
            } else {
                format!("HTTP {status}: {message}")
            }
        }
        YouTubeError::MissingField(field) => format!("Missing {field}"),
        YouTubeError::VideoNotFound(id) => format!("Video not found: {id}"),
        YouTubeError::NoChannel => "No channel".to_string(),
        YouTubeError::Config(msg) => format!("Config: {msg}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, reason: Option<&str>) -> YouTubeError {
        YouTubeError::Api {
            status,
            reason: reason.map(str::to_string),
            message: "msg".to_string(),
        }
    }

    #[test]
    fn throttling_maps_to_rate_limited() {
        assert!(PlatformError::from(api(429, None)).is_rate_limited());
        assert!(PlatformError::from(api(403, Some("rateLimitExceeded"))).is_rate_limited());
        assert!(!PlatformError::from(api(403, Some("forbidden"))).is_rate_limited());
    }

    #[test]
    fn quota_exhaustion_is_not_transient() {
        let err = PlatformError::from(api(403, Some("quotaExceeded")));
        assert!(!err.is_transient());
    }

    #[test]
    fn status_codes_map_to_platform_errors() {
        assert!(matches!(
            PlatformError::from(api(401, None)),
            PlatformError::AuthRequired
        ));
        assert!(matches!(
            PlatformError::from(api(404, None)),
            PlatformError::NotFound { .. }
        ));
        let server = PlatformError::from(api(500, None));
        assert!(matches!(server, PlatformError::Api { status: 500, .. }));
        assert!(server.is_transient());
    }

    #[test]
    fn timeouts_and_missing_fields_map() {
        let err = PlatformError::from(YouTubeError::Http(HttpError::Timeout("t".into())));
        assert!(matches!(err, PlatformError::Timeout { .. }));
        assert!(err.is_transient());

        let err = PlatformError::from(YouTubeError::MissingField("snippet"));
        assert!(matches!(err, PlatformError::InvalidResponse { .. }));
    }

    #[test]
    fn short_messages() {
        assert_eq!(
            short_error_message(&api(403, Some("quotaExceeded"))),
            "HTTP 403: quotaExceeded"
        );
        let long = YouTubeError::Api {
            status: 400,
            reason: None,
            message: "x".repeat(80),
        };
        assert!(short_error_message(&long).ends_with("..."));
    }
}
