//! OAuth 2.0 types and session records
//!
//! Token, profile and session shapes shared by the clients, the store and
//! the controller. Persisted records serialize with snake_case keys.

use chrono::{DateTime, Utc};
use kickstream_domain::constants::KICK_DEFAULT_AVATAR_URL;
use kickstream_domain::{KickStreamError, OAuthSettings, TokenEndpointMode};
use serde::{Deserialize, Serialize};

/// OAuth 2.0 access and refresh tokens with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,

    /// Optional because the provider does not always issue one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    pub token_type: String,

    /// Access token lifetime in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Granted scopes (space-separated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
        scope: Option<String>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
            scope,
        }
    }
}

/// Raw token endpoint response (RFC 6749 §5.1). Every field is optional so
/// that a 2xx body without `access_token` can be reported precisely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert into a [`TokenSet`], or `None` when no usable access token
    /// was issued.
    #[must_use]
    pub fn into_token_set(self) -> Option<TokenSet> {
        let access_token = self.access_token.filter(|token| !token.trim().is_empty())?;
        let mut tokens = TokenSet::new(
            access_token,
            self.refresh_token.filter(|token| !token.is_empty()),
            self.expires_in,
            self.scope,
        );
        if let Some(token_type) = self.token_type {
            tokens.token_type = token_type;
        }
        Some(tokens)
    }
}

/// Where authorization codes and refresh tokens are exchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEndpoint {
    /// Provider token endpoint, form-encoded.
    Direct { url: String },
    /// Trusted relay, JSON body; the relay adds the client secret.
    Relay { url: String },
}

impl TokenEndpoint {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Direct { url } | Self::Relay { url } => url,
        }
    }

    #[must_use]
    pub fn mode(&self) -> TokenEndpointMode {
        match self {
            Self::Direct { .. } => TokenEndpointMode::Direct,
            Self::Relay { .. } => TokenEndpointMode::Relay,
        }
    }
}

/// Resolved OAuth client configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub authorize_url: String,
    /// Sent byte-for-byte in both the authorize request and token exchange
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub token_endpoint: TokenEndpoint,
}

impl OAuthConfig {
    /// Get scopes as space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

impl TryFrom<&OAuthSettings> for OAuthConfig {
    type Error = KickStreamError;

    fn try_from(settings: &OAuthSettings) -> Result<Self, Self::Error> {
        let token_endpoint = match settings.token_mode {
            TokenEndpointMode::Direct => TokenEndpoint::Direct { url: settings.token_url.clone() },
            TokenEndpointMode::Relay => {
                let url = settings.relay_url.clone().ok_or_else(|| {
                    KickStreamError::Config("relay token mode requires oauth.relay_url".into())
                })?;
                TokenEndpoint::Relay { url }
            }
        };

        Ok(Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone().filter(|s| !s.is_empty()),
            authorize_url: settings.authorize_url.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            scopes: settings.scopes.clone(),
            token_endpoint,
        })
    }
}

/// Normalized user profile, independent of which endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

/// Authenticated user record persisted under `kickstream_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl Session {
    /// Build a session from a freshly fetched profile and the tokens that
    /// fetched it. A missing avatar falls back to the Kick default image.
    #[must_use]
    pub fn from_parts(profile: UserProfile, tokens: &TokenSet) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            avatar_url: Some(
                profile.avatar_url.unwrap_or_else(|| KICK_DEFAULT_AVATAR_URL.to_string()),
            ),
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            email: profile.email,
            verified: profile.verified,
        }
    }

    /// Overlay fresher profile fields. Fields the profile does not carry
    /// keep their stored values. Returns whether anything changed.
    pub fn merge_profile(&mut self, profile: &UserProfile) -> bool {
        let before = self.clone();

        self.id.clone_from(&profile.id);
        self.username.clone_from(&profile.username);
        if profile.avatar_url.is_some() {
            self.avatar_url.clone_from(&profile.avatar_url);
        }
        if profile.email.is_some() {
            self.email.clone_from(&profile.email);
        }
        if profile.verified.is_some() {
            self.verified = profile.verified;
        }

        *self != before
    }

    /// Replace the tokens after a refresh grant. A refresh response without
    /// a new refresh token keeps the old one.
    pub fn apply_tokens(&mut self, tokens: &TokenSet) {
        self.access_token.clone_from(&tokens.access_token);
        if tokens.refresh_token.is_some() {
            self.refresh_token.clone_from(&tokens.refresh_token);
        }
    }

    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// In-flight login attempt, persisted between redirect and return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub code_verifier: String,
    pub state: String,
    pub return_to: Option<String>,
}

/// One diagnostic entry in the rolling auth log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthLogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl AuthLogEntry {
    #[must_use]
    pub fn new(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self { timestamp: Utc::now(), message: message.into(), data }
    }
}

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Uninitialized,
    Restoring,
    Authenticated,
    Unauthenticated,
    LoggingIn,
}

kickstream_domain::impl_domain_status_conversions!(AuthState {
    Uninitialized => "uninitialized",
    Restoring => "restoring",
    Authenticated => "authenticated",
    Unauthenticated => "unauthenticated",
    LoggingIn => "logging_in",
});
