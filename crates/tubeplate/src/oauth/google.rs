//! Google OAuth 2.0 token endpoint client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{OAuthError, TokenGrant, TokenRefresher};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Google's token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Error response body from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Combined response type for the token endpoint (can be success or error).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Success(TokenGrant),
    Error(TokenErrorResponse),
}

/// Client for the authorization-code and refresh-token grants.
pub struct GoogleOAuthClient {
    transport: Arc<dyn HttpTransport>,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl GoogleOAuthClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: Option<String>,
    ) -> Result<Self, OAuthError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| OAuthError::Configuration(e.to_string()))?;
        Ok(Self::new_with_transport(
            client_id,
            client_secret,
            token_url,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: Option<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
        }
    }

    async fn post_token(&self, fields: &[(&str, &str)]) -> Result<TokenGrant, OAuthError> {
        let request = HttpRequest::new(HttpMethod::Post, &self.token_url)
            .header("Accept", "application/json")
            .form(fields);

        let response = self.transport.send(request).await?;
        parse_token_response(&response)
    }
}

/// Interpret a token endpoint response.
///
/// Error bodies are classified by their `error` code before the status is
/// considered, since Google reports `invalid_grant` with HTTP 400.
fn parse_token_response(response: &HttpResponse) -> Result<TokenGrant, OAuthError> {
    match response.json::<TokenResponse>() {
        Ok(TokenResponse::Success(grant)) if response.is_success() => Ok(grant),
        Ok(TokenResponse::Error(err)) => Err(OAuthError::from_error_response(
            &err.error,
            err.error_description.as_deref(),
        )),
        _ if response.status == 429 => Err(OAuthError::RateLimited),
        _ if response.status >= 500 => Err(OAuthError::Server {
            status: response.status,
        }),
        Ok(TokenResponse::Success(_)) => Err(OAuthError::Parse(format!(
            "unexpected HTTP {} with a token body",
            response.status
        ))),
        Err(e) => Err(OAuthError::Parse(format!(
            "HTTP {}: {e}",
            response.status
        ))),
    }
}

#[async_trait]
impl TokenRefresher for GoogleOAuthClient {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, OAuthError> {
        self.post_token(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, OAuthError> {
        self.post_token(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .await
    }
}
