//! Kick user-info client
//!
//! Kick has served the authenticated user from several endpoints with
//! different JSON shapes over time. The client walks the configured
//! endpoints in order, decodes whatever answered into [`ProfileResponse`]
//! and normalizes it into a [`UserProfile`].

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::traits::ProfileFetcher;
use super::types::UserProfile;
use crate::error::{ErrorClassification, ErrorSeverity};
use crate::http::HttpClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// An endpoint answered 401.
    #[error("access token is invalid or expired")]
    TokenInvalid,

    /// Every endpoint failed and the token carries no usable identity.
    #[error("no profile endpoint returned a usable profile: {0}")]
    Unavailable(String),

    /// Every endpoint failed before producing an HTTP response.
    #[error("profile endpoints unreachable: {0}")]
    Transport(String),
}

impl ErrorClassification for ProfileError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TokenInvalid => ErrorSeverity::Info,
            Self::Transport(_) => ErrorSeverity::Warning,
            Self::Unavailable(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// User ids arrive as numbers on some endpoints and strings on others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProfileId {
    Number(i64),
    Text(String),
}

impl ProfileId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedUser {
    pub id: Option<ProfileId>,
    pub username: String,
    pub profile_pic: Option<String>,
    pub email: Option<String>,
    pub verified: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeUser {
    pub user_id: ProfileId,
    pub name: String,
    pub profile_picture: Option<String>,
    pub email: Option<String>,
}

/// Known user-info response shapes. Variant order is the decode order.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProfileResponse {
    /// `{ "data": [ { "user_id", "name", "profile_picture"?, "email"? } ] }`
    Envelope { data: Vec<EnvelopeUser> },
    /// `{ "user": { "username", ... }, "id"? }`
    Nested { user: NestedUser, id: Option<ProfileId> },
    /// `{ "id", "username", "profile_pic"?, "email"?, "verified"? }`
    Current {
        id: ProfileId,
        username: String,
        profile_pic: Option<String>,
        email: Option<String>,
        verified: Option<bool>,
    },
    /// `{ "user_id", "name", "avatar"?, "email"? }`
    Legacy { user_id: ProfileId, name: String, avatar: Option<String>, email: Option<String> },
}

impl ProfileResponse {
    /// Normalize into a [`UserProfile`]. `None` for an empty envelope or an
    /// empty username.
    #[must_use]
    pub fn normalize(self) -> Option<UserProfile> {
        let profile = match self {
            Self::Envelope { data } => {
                let user = data.into_iter().next()?;
                UserProfile {
                    id: user.user_id.into_string(),
                    username: user.name,
                    avatar_url: user.profile_picture,
                    email: user.email,
                    verified: None,
                }
            }
            Self::Nested { user, id } => {
                let id = user.id.or(id).map_or_else(|| user.username.clone(), ProfileId::into_string);
                UserProfile {
                    id,
                    username: user.username,
                    avatar_url: user.profile_pic,
                    email: user.email,
                    verified: user.verified,
                }
            }
            Self::Current { id, username, profile_pic, email, verified } => UserProfile {
                id: id.into_string(),
                username,
                avatar_url: profile_pic,
                email,
                verified,
            },
            Self::Legacy { user_id, name, avatar, email } => UserProfile {
                id: user_id.into_string(),
                username: name,
                avatar_url: avatar,
                email,
                verified: None,
            },
        };

        if profile.username.trim().is_empty() {
            return None;
        }
        Some(profile)
    }
}

#[derive(Debug, Deserialize)]
struct IdentityClaims {
    sub: Option<ProfileId>,
    name: Option<String>,
}

/// Decode `sub` / `name` from a three-part JWT access token. The signature
/// is not checked; the result is only used for display identity.
#[must_use]
pub fn profile_from_token_claims(access_token: &str) -> Option<UserProfile> {
    let mut parts = access_token.split('.');
    let (_, payload, _) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: IdentityClaims = serde_json::from_slice(&bytes).ok()?;

    let sub = claims.sub.map(ProfileId::into_string).filter(|s| !s.is_empty());
    let name = claims.name.filter(|n| !n.is_empty());

    let (id, username) = match (sub, name) {
        (Some(sub), Some(name)) => (sub, name),
        (Some(sub), None) => {
            let short: String = sub.chars().take(6).collect();
            (sub, format!("user-{short}"))
        }
        (None, Some(name)) => (name.clone(), name),
        (None, None) => return None,
    };

    Some(UserProfile { id, username, avatar_url: None, email: None, verified: None })
}

/// Stable synthetic profile derived from the token. Only produced when the
/// placeholder fallback is switched on.
#[must_use]
pub fn placeholder_profile(access_token: &str) -> UserProfile {
    let digest = hex::encode(Sha256::digest(access_token.as_bytes()));
    UserProfile {
        id: format!("temp-{}", &digest[..12]),
        username: format!("kickuser_{}", &digest[12..17]),
        avatar_url: None,
        email: None,
        verified: None,
    }
}

/// Client for the Kick user-info endpoints
#[derive(Debug, Clone)]
pub struct ProfileClient {
    http: HttpClient,
    endpoints: Vec<String>,
    placeholder_fallback: bool,
}

impl ProfileClient {
    #[must_use]
    pub fn new(http: HttpClient, endpoints: Vec<String>) -> Self {
        Self { http, endpoints, placeholder_fallback: false }
    }

    /// Allow a synthetic profile when nothing else works.
    #[must_use]
    pub fn with_placeholder_fallback(mut self, enabled: bool) -> Self {
        self.placeholder_fallback = enabled;
        self
    }

    /// Fetch and normalize the profile for `access_token`.
    ///
    /// # Errors
    /// [`ProfileError::TokenInvalid`] as soon as any endpoint answers 401,
    /// [`ProfileError::Transport`] when no endpoint could be reached, and
    /// [`ProfileError::Unavailable`] otherwise.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, ProfileError> {
        let mut transport_failures = 0usize;
        let mut last_failure = String::from("no profile endpoints configured");

        for endpoint in &self.endpoints {
            let request = self
                .http
                .request(Method::GET, endpoint.as_str())
                .header(AUTHORIZATION, format!("Bearer {access_token}"))
                .header(ACCEPT, "application/json");

            let response = match self.http.send(request).await {
                Ok(response) => response,
                Err(err) => {
                    debug!(endpoint = %endpoint, error = %err, "profile endpoint unreachable");
                    transport_failures += 1;
                    last_failure = format!("{endpoint}: {err}");
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                info!(endpoint = %endpoint, "profile endpoint rejected access token");
                return Err(ProfileError::TokenInvalid);
            }
            if !status.is_success() {
                debug!(endpoint = %endpoint, status = status.as_u16(), "profile endpoint failed");
                last_failure = format!("{endpoint}: HTTP {}", status.as_u16());
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    last_failure = format!("{endpoint}: {err}");
                    continue;
                }
            };

            let normalized =
                serde_json::from_str::<ProfileResponse>(&body).ok().and_then(ProfileResponse::normalize);
            match normalized {
                Some(profile) => {
                    debug!(endpoint = %endpoint, user_id = %profile.id, "profile fetched");
                    return Ok(profile);
                }
                None => {
                    debug!(endpoint = %endpoint, "profile body did not match a known shape");
                    last_failure = format!("{endpoint}: unrecognized profile shape");
                }
            }
        }

        if !self.endpoints.is_empty() && transport_failures == self.endpoints.len() {
            return Err(ProfileError::Transport(last_failure));
        }

        if let Some(profile) = profile_from_token_claims(access_token) {
            info!(user_id = %profile.id, "using identity claims from access token");
            return Ok(profile);
        }

        if self.placeholder_fallback {
            warn!("profile endpoints failed; using placeholder profile");
            return Ok(placeholder_profile(access_token));
        }

        Err(ProfileError::Unavailable(last_failure))
    }
}

#[async_trait]
impl ProfileFetcher for ProfileClient {
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, ProfileError> {
        ProfileClient::fetch_profile(self, access_token).await
    }
}
