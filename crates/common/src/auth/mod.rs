//! Kick OAuth 2.0 + PKCE login and session management
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────┐
//! │ AuthSessionController │  restore / verify / login / redirect / logout
//! └──────────┬────────────┘
//!            │
//!            ├──► TokenExchanger   (OAuthClient: direct or relay token endpoint)
//!            ├──► ProfileFetcher   (ProfileClient: user-info endpoints)
//!            ├──► Navigator        (host location bar)
//!            ├──► SessionStore ──► KeyValueStore (file, memory)
//!            └──► AuthLog          (rolling diagnostics, 20 entries)
//! ```
//!
//! # Module Organization
//!
//! - **[`pkce`]**: verifier, S256 challenge and state generation
//! - **[`authorize`]**: authorize URL building and redirect parsing
//! - **[`client`]**: token endpoint client
//! - **[`profile`]**: user-info client and response normalization
//! - **[`store`]**: typed persisted keys
//! - **[`auth_log`]**: bounded auth event log
//! - **[`service`]**: the session controller
//!
//! # Security
//!
//! - The client secret never leaves the relay unless direct mode is
//!   explicitly configured with one
//! - State is compared in constant time
//! - Tokens and verifiers are never logged, only their presence

pub mod auth_log;
pub mod authorize;
pub mod client;
pub mod errors;
pub mod pkce;
pub mod profile;
pub mod service;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
pub use auth_log::AuthLog;
pub use authorize::{
    build_authorization_url, parse_authorization_url, strip_redirect_params, AuthorizationParams,
    RedirectParams,
};
pub use client::{OAuthClient, TokenExchangeError};
pub use errors::AuthError;
pub use pkce::{
    derive_code_challenge, generate_code_verifier, generate_state, validate_state, PkceChallenge,
    PkceError,
};
pub use profile::{ProfileClient, ProfileError, ProfileResponse};
pub use service::{AuthSessionController, LoadOutcome};
pub use store::{MemoryStore, SessionStore, StoreError, StoredPending};
pub use traits::{KeyValueStore, Navigator, ProfileFetcher, TokenExchanger};
pub use types::{
    AuthLogEntry, AuthState, OAuthConfig, PendingAuthorization, Session, TokenEndpoint, TokenSet,
    UserProfile,
};
