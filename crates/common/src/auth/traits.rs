//! Ports used by the auth session controller
//!
//! These traits enable dependency injection and testing by abstracting the
//! token endpoint, the user-info API, the persisted key-value store and the
//! host's location bar.

use async_trait::async_trait;

use super::client::TokenExchangeError;
use super::profile::ProfileError;
use super::store::StoreError;
use super::types::{TokenSet, UserProfile};

/// Token endpoint operations
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Exchange an authorization code plus its PKCE verifier for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, TokenExchangeError>;

    /// Run a refresh-token grant.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, TokenExchangeError>;
}

/// User-info lookup with a bearer token
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, ProfileError>;
}

/// Persistent string key-value store
///
/// Values are opaque strings (JSON documents in practice). Implementations
/// must make a `set` durable before returning.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// The host's notion of "current location"
///
/// A browser would map these onto the address bar and history API; the CLI
/// maps them onto the last received redirect and stdout.
pub trait Navigator: Send + Sync {
    /// Current location, absolute or relative (e.g. `/login?code=...`).
    fn current_url(&self) -> String;

    /// Replace the visible location without navigating.
    fn replace_url(&self, url: &str);

    /// Navigate to an in-app route or an external URL.
    fn navigate(&self, destination: &str);
}
