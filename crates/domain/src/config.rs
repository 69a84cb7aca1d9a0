//! Configuration structures
//!
//! Every section carries serde defaults so a partial config file (or none at
//! all) yields a working configuration pointed at the Kick production
//! endpoints.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALLBACK_TIMEOUT_SECS, DEFAULT_HTTP_MAX_ATTEMPTS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_LANDING_ROUTE, DEFAULT_REDIRECT_URI, DEFAULT_RELAY_BIND, DEFAULT_STORE_FILE,
    KICK_AUTHORIZE_URL, KICK_CLIENT_ID, KICK_PROFILE_ENDPOINTS, KICK_SCOPES, KICK_TOKEN_URL,
};
use crate::errors::{KickStreamError, Result};

/// How the client reaches the token endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenEndpointMode {
    /// Form POST straight to the provider token endpoint.
    #[default]
    Direct,
    /// JSON POST to a trusted relay that holds the client secret.
    Relay,
}

crate::impl_domain_status_conversions!(TokenEndpointMode {
    Direct => "direct",
    Relay => "relay",
});

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub oauth: OAuthSettings,
    pub profile: ProfileSettings,
    pub http: HttpSettings,
    pub storage: StorageSettings,
    pub relay: RelaySettings,
    pub callback: CallbackSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    pub client_id: String,
    /// Only ever set on the relay host or for direct mode with a
    /// confidential client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub token_mode: TokenEndpointMode,
    pub relay_url: Option<String>,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: KICK_CLIENT_ID.to_string(),
            client_secret: None,
            authorize_url: KICK_AUTHORIZE_URL.to_string(),
            token_url: KICK_TOKEN_URL.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: KICK_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            token_mode: TokenEndpointMode::Direct,
            relay_url: None,
        }
    }
}

impl OAuthSettings {
    /// Space-delimited scope string as sent to the authorize endpoint.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// User-info endpoints, tried in order.
    pub endpoints: Vec<String>,
    /// Produce a synthetic profile when every endpoint fails. Bootstrap and
    /// test use only.
    pub placeholder_fallback: bool,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            endpoints: KICK_PROFILE_ENDPOINTS.iter().map(|s| (*s).to_string()).collect(),
            placeholder_fallback: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    /// Total attempts per request, including the first.
    pub max_attempts: usize,
    pub retry_backoff_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_attempts: DEFAULT_HTTP_MAX_ATTEMPTS,
            retry_backoff_ms: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { path: PathBuf::from(DEFAULT_STORE_FILE) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    pub bind: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self { bind: DEFAULT_RELAY_BIND.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackSettings {
    pub timeout_secs: u64,
    /// Where a successful login lands when no return-to hint was given.
    pub landing_route: String,
}

impl Default for CallbackSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
            landing_route: DEFAULT_LANDING_ROUTE.to_string(),
        }
    }
}

impl Config {
    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.oauth.client_id.trim().is_empty() {
            return Err(KickStreamError::Config("oauth.client_id must not be empty".into()));
        }
        if !is_http_url(&self.oauth.redirect_uri) {
            return Err(KickStreamError::Config(format!(
                "oauth.redirect_uri must be an http(s) URL, got '{}'",
                self.oauth.redirect_uri
            )));
        }
        if self.oauth.token_mode == TokenEndpointMode::Relay {
            match self.oauth.relay_url.as_deref() {
                Some(url) if is_http_url(url) => {}
                _ => {
                    return Err(KickStreamError::Config(
                        "oauth.relay_url is required when oauth.token_mode = \"relay\"".into(),
                    ))
                }
            }
        }
        if self.profile.endpoints.is_empty() {
            return Err(KickStreamError::Config(
                "profile.endpoints must list at least one endpoint".into(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(KickStreamError::Config("http.timeout_secs must be positive".into()));
        }
        if self.http.max_attempts == 0 {
            return Err(KickStreamError::Config("http.max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
