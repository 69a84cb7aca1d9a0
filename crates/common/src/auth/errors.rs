//! Auth flow error taxonomy
//!
//! Every failure the controller can surface maps onto one [`AuthError`]
//! variant. Component errors from the token and profile clients are folded
//! in here so callers only ever see this type.

use std::time::Duration;

use thiserror::Error;

use super::client::TokenExchangeError;
use super::store::StoreError;
use crate::error::{ErrorClassification, ErrorSeverity};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The provider redirected back with `error=...`.
    #[error("authorization denied by provider: {error}")]
    ProviderDenied { error: String, description: Option<String> },

    /// Redirect `state` missing, mismatched, or no login was pending.
    #[error("OAuth state mismatch")]
    CsrfMismatch,

    #[error("code verifier missing for pending authorization")]
    MissingVerifier,

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(#[from] TokenExchangeError),

    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// The provider rejected the access token (HTTP 401).
    #[error("access token is invalid or expired")]
    TokenInvalid,

    /// Network or timeout failure while re-verifying a restored session.
    #[error("session verification failed transiently: {0}")]
    TransientVerificationFailure(String),

    #[error("session storage failed: {0}")]
    Storage(String),

    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Short message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderDenied { description, .. } => description
                .clone()
                .unwrap_or_else(|| "Failed to login with Kick. Please try again.".to_string()),
            Self::CsrfMismatch => {
                "Authentication failed due to security mismatch. Please try again.".to_string()
            }
            Self::MissingVerifier => {
                "Code verifier is missing. Please try logging in again.".to_string()
            }
            Self::TokenExchangeFailed(_) => {
                "Failed to exchange authorization code with Kick. Please try again.".to_string()
            }
            Self::ProfileFetchFailed(_) => {
                "Failed to fetch your Kick profile. Please try again.".to_string()
            }
            Self::TokenInvalid => "Your Kick session has expired. Please log in again.".to_string(),
            Self::TransientVerificationFailure(_) => {
                "Could not reach Kick to verify your session.".to_string()
            }
            Self::Storage(_) | Self::Internal(_) => {
                "Failed to complete login process. Please try again.".to_string()
            }
        }
    }

    /// Whether this failure discards the session and any pending login.
    #[must_use]
    pub fn clears_session(&self) -> bool {
        !matches!(self, Self::TransientVerificationFailure(_))
    }

    /// Stable label for log fields and auth log payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProviderDenied { .. } => "provider_denied",
            Self::CsrfMismatch => "csrf_mismatch",
            Self::MissingVerifier => "missing_verifier",
            Self::TokenExchangeFailed(_) => "token_exchange_failed",
            Self::ProfileFetchFailed(_) => "profile_fetch_failed",
            Self::TokenInvalid => "token_invalid",
            Self::TransientVerificationFailure(_) => "transient_verification_failure",
            Self::Storage(_) => "storage",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl ErrorClassification for AuthError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::TransientVerificationFailure(_) => true,
            Self::TokenExchangeFailed(inner) => inner.is_retryable(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TransientVerificationFailure(_) | Self::TokenInvalid => ErrorSeverity::Info,
            Self::ProviderDenied { .. } | Self::MissingVerifier => ErrorSeverity::Warning,
            Self::CsrfMismatch => ErrorSeverity::Critical,
            Self::TokenExchangeFailed(_)
            | Self::ProfileFetchFailed(_)
            | Self::Storage(_)
            | Self::Internal(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::CsrfMismatch)
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
