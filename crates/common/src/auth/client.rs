//! OAuth 2.0 token client with PKCE support
//!
//! Exchanges authorization codes and refresh tokens either directly against
//! the provider token endpoint (form-encoded) or through the trusted relay
//! (JSON), depending on the configured [`TokenEndpoint`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::authorize::build_authorization_url;
use super::traits::TokenExchanger;
use super::types::{OAuthConfig, TokenEndpoint, TokenResponse, TokenSet};
use crate::error::{ErrorClassification, ErrorSeverity};
use crate::http::HttpClient;

/// Error type for token endpoint calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenExchangeError {
    /// Non-2xx response; the body is kept verbatim for diagnostics.
    #[error("token endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("token response is not valid JSON: {0}")]
    Parse(String),

    #[error("token response did not include an access token")]
    MissingAccessToken,

    #[error("token endpoint unreachable: {0}")]
    Transport(String),

    #[error("no refresh token available")]
    NoRefreshToken,
}

impl ErrorClassification for TokenExchangeError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Transport(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// OAuth 2.0 client for the Kick token endpoint
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http: HttpClient,
}

impl OAuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Authorize URL for a pending login with the given verifier and state.
    #[must_use]
    pub fn authorization_url(&self, code_verifier: &str, state: &str) -> String {
        build_authorization_url(&self.config, code_verifier, state)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    /// See [`TokenExchangeError`]; transport failures have already been
    /// retried once by the HTTP client.
    pub async fn exchange_code_for_tokens(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, TokenExchangeError> {
        let request = match &self.config.token_endpoint {
            TokenEndpoint::Direct { url } => {
                let mut form = vec![
                    ("grant_type", "authorization_code"),
                    ("client_id", self.config.client_id.as_str()),
                    ("redirect_uri", self.config.redirect_uri.as_str()),
                    ("code", code),
                    ("code_verifier", code_verifier),
                ];
                if let Some(secret) = self.config.client_secret.as_deref() {
                    form.push(("client_secret", secret));
                }
                self.http.request(Method::POST, url).header(ACCEPT, "application/json").form(&form)
            }
            TokenEndpoint::Relay { url } => self
                .http
                .request(Method::POST, url)
                .header(ACCEPT, "application/json")
                .json(&json!({
                    "code": code,
                    "code_verifier": code_verifier,
                    "redirect_uri": self.config.redirect_uri,
                })),
        };

        info!(
            mode = %self.config.token_endpoint.mode(),
            has_client_secret = self.config.client_secret.is_some(),
            "exchanging authorization code"
        );
        self.execute(request).await
    }

    /// Obtain a new access token with a refresh-token grant.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, TokenExchangeError> {
        if refresh_token.is_empty() {
            return Err(TokenExchangeError::NoRefreshToken);
        }

        let request = match &self.config.token_endpoint {
            TokenEndpoint::Direct { url } => {
                let mut form = vec![
                    ("grant_type", "refresh_token"),
                    ("client_id", self.config.client_id.as_str()),
                    ("refresh_token", refresh_token),
                ];
                if let Some(secret) = self.config.client_secret.as_deref() {
                    form.push(("client_secret", secret));
                }
                self.http.request(Method::POST, url).header(ACCEPT, "application/json").form(&form)
            }
            TokenEndpoint::Relay { url } => self
                .http
                .request(Method::POST, url)
                .header(ACCEPT, "application/json")
                .json(&json!({
                    "grant_type": "refresh_token",
                    "refresh_token": refresh_token,
                })),
        };

        info!(mode = %self.config.token_endpoint.mode(), "refreshing access token");
        self.execute(request).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<TokenSet, TokenExchangeError> {
        let response = self
            .http
            .send(request)
            .await
            .map_err(|err| TokenExchangeError::Transport(err.to_string()))?;

        let status = response.status();
        let body =
            response.text().await.map_err(|err| TokenExchangeError::Transport(err.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "token endpoint rejected request");
            return Err(TokenExchangeError::Status { status: status.as_u16(), body });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|err| TokenExchangeError::Parse(err.to_string()))?;
        let tokens = parsed.into_token_set().ok_or(TokenExchangeError::MissingAccessToken)?;

        debug!(
            has_refresh_token = tokens.refresh_token.is_some(),
            expires_in = ?tokens.expires_in,
            scope = ?tokens.scope,
            "token response accepted"
        );
        Ok(tokens)
    }
}

#[async_trait]
impl TokenExchanger for OAuthClient {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, TokenExchangeError> {
        self.exchange_code_for_tokens(code, code_verifier).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, TokenExchangeError> {
        self.refresh_access_token(refresh_token).await
    }
}
