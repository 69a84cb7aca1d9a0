//! Auth session controller
//!
//! Orchestrates session restore, background re-verification, login
//! initiation, redirect processing and logout over injected ports. All
//! state lives behind one `RwLock`; clones share it.
//!
//! ```text
//! Uninitialized ─► Restoring ─┬─► Authenticated ◄──────────┐
//!                             └─► Unauthenticated ─► LoggingIn
//!                                        ▲                 │
//!                                        └──── (error) ────┘
//! ```

use std::sync::Arc;

use kickstream_domain::constants::{DEFAULT_LANDING_ROUTE, LOGIN_ROUTE};
use serde_json::json;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::auth_log::AuthLog;
use super::authorize::{build_authorization_url, strip_redirect_params, RedirectParams};
use super::errors::AuthError;
use super::pkce::{validate_state, PkceChallenge};
use super::profile::ProfileError;
use super::store::SessionStore;
use super::traits::{Navigator, ProfileFetcher, TokenExchanger};
use super::types::{AuthState, OAuthConfig, PendingAuthorization, Session};
use crate::error::ErrorClassification;

#[derive(Debug)]
struct ControllerState {
    auth_state: AuthState,
    session: Option<Session>,
    last_error: Option<AuthError>,
}

/// Result of [`AuthSessionController::on_load`].
#[derive(Debug)]
pub struct LoadOutcome {
    /// State right after restore and any redirect processing.
    pub state: AuthState,
    /// Background re-verification, when one was started.
    pub verification: Option<JoinHandle<()>>,
}

struct Inner {
    oauth: OAuthConfig,
    exchanger: Arc<dyn TokenExchanger>,
    profiles: Arc<dyn ProfileFetcher>,
    navigator: Arc<dyn Navigator>,
    store: SessionStore,
    log: Arc<AuthLog>,
    landing_route: String,
    state: RwLock<ControllerState>,
}

/// Owner of the authenticated session.
#[derive(Clone)]
pub struct AuthSessionController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AuthSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionController")
            .field("client_id", &self.inner.oauth.client_id)
            .field("landing_route", &self.inner.landing_route)
            .finish_non_exhaustive()
    }
}

impl AuthSessionController {
    #[must_use]
    pub fn new(
        oauth: OAuthConfig,
        exchanger: Arc<dyn TokenExchanger>,
        profiles: Arc<dyn ProfileFetcher>,
        navigator: Arc<dyn Navigator>,
        store: SessionStore,
        log: Arc<AuthLog>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                oauth,
                exchanger,
                profiles,
                navigator,
                store,
                log,
                landing_route: DEFAULT_LANDING_ROUTE.to_string(),
                state: RwLock::new(ControllerState {
                    auth_state: AuthState::Uninitialized,
                    session: None,
                    last_error: None,
                }),
            }),
        }
    }

    /// Route used after login when no return-to hint was stored.
    ///
    /// Must be called before the controller is cloned or shared.
    #[must_use]
    pub fn with_landing_route(mut self, route: impl Into<String>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.landing_route = route.into();
        }
        self
    }

    pub async fn state(&self) -> AuthState {
        self.inner.state.read().await.auth_state
    }

    pub async fn session(&self) -> Option<Session> {
        self.inner.state.read().await.session.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        let guard = self.inner.state.read().await;
        guard.auth_state == AuthState::Authenticated && guard.session.is_some()
    }

    /// Last surfaced error. Transient verification failures never land here.
    pub async fn last_error(&self) -> Option<AuthError> {
        self.inner.state.read().await.last_error.clone()
    }

    #[must_use]
    pub fn auth_log(&self) -> Arc<AuthLog> {
        Arc::clone(&self.inner.log)
    }

    /// Page-load entry point.
    ///
    /// Restores the persisted session, then either processes an OAuth
    /// redirect found on the current location or, when a session was
    /// restored, starts background re-verification. Never both.
    pub async fn on_load(&self) -> LoadOutcome {
        let params = RedirectParams::from_location(&self.inner.navigator.current_url());
        let restored = self.restore().await;

        if params.is_oauth_return() {
            if let Err(err) = self.handle_redirect().await {
                debug!(kind = err.kind(), "redirect processing failed");
            }
            return LoadOutcome { state: self.state().await, verification: None };
        }

        let verification = restored.then(|| self.spawn_verification());
        LoadOutcome { state: self.state().await, verification }
    }

    /// Read the persisted session and move to `Authenticated` or
    /// `Unauthenticated` accordingly. Returns whether a session was found.
    pub async fn restore(&self) -> bool {
        self.set_auth_state(AuthState::Restoring).await;
        self.inner.log.record("Checking auth status", None);

        let session = self.inner.store.load_session().unwrap_or_else(|err| {
            warn!(error = %err, "failed to read stored session");
            None
        });

        let mut guard = self.inner.state.write().await;
        match session {
            Some(session) => {
                self.inner.log.record(
                    "Restored user from storage",
                    Some(json!({ "username": session.username })),
                );
                info!(user_id = %session.id, "restored session");
                guard.session = Some(session);
                guard.auth_state = AuthState::Authenticated;
                true
            }
            None => {
                self.inner.log.record("No stored user found", None);
                guard.session = None;
                guard.auth_state = AuthState::Unauthenticated;
                false
            }
        }
    }

    /// Run [`verify_session`](Self::verify_session) on the runtime.
    pub fn spawn_verification(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            if let Err(err) = controller.verify_session().await {
                debug!(kind = err.kind(), error = %err, "background verification ended with error");
            }
        })
    }

    /// Re-verify the current session against the user-info API.
    ///
    /// Results are only written back while the session still carries the
    /// access token this check started with.
    pub async fn verify_session(&self) -> Result<(), AuthError> {
        let Some(mut session) = self.session().await else {
            return Ok(());
        };
        let started_with = session.access_token.clone();
        self.inner.log.record("Verifying user session", None);

        match self.inner.profiles.fetch_profile(&started_with).await {
            Ok(profile) => {
                session.merge_profile(&profile);
                self.inner.log.record(
                    "Verified user session is valid",
                    Some(json!({ "userId": profile.id })),
                );
                self.commit_verified(&started_with, session).await
            }
            Err(ProfileError::TokenInvalid) if session.has_refresh_token() => {
                self.refresh_session(&started_with, session).await
            }
            Err(ProfileError::TokenInvalid) => {
                Err(self.fail_verification(&started_with, AuthError::TokenInvalid).await)
            }
            Err(ProfileError::Transport(reason)) => {
                self.inner.log.record(
                    "Session verification deferred",
                    Some(json!({ "reason": reason })),
                );
                Err(AuthError::TransientVerificationFailure(reason))
            }
            Err(err @ ProfileError::Unavailable(_)) => Err(self
                .fail_verification(&started_with, AuthError::ProfileFetchFailed(err.to_string()))
                .await),
        }
    }

    async fn refresh_session(
        &self,
        started_with: &str,
        mut session: Session,
    ) -> Result<(), AuthError> {
        self.inner.log.record("Access token rejected; attempting refresh", None);
        let refresh_token = session.refresh_token.clone().unwrap_or_default();

        let tokens = match self.inner.exchanger.refresh(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(err) if err.is_retryable() => {
                self.inner
                    .log
                    .record("Token refresh deferred", Some(json!({ "reason": err.to_string() })));
                return Err(AuthError::TransientVerificationFailure(err.to_string()));
            }
            Err(err) => {
                self.inner
                    .log
                    .record("Token refresh failed", Some(json!({ "error": err.to_string() })));
                return Err(self.fail_verification(started_with, AuthError::TokenInvalid).await);
            }
        };

        session.apply_tokens(&tokens);
        self.inner.log.record(
            "Token refresh successful",
            Some(json!({ "hasRefreshToken": tokens.refresh_token.is_some() })),
        );

        match self.inner.profiles.fetch_profile(&session.access_token).await {
            Ok(profile) => {
                session.merge_profile(&profile);
            }
            Err(ProfileError::Transport(reason)) => {
                debug!(%reason, "profile unreachable after refresh; keeping stored fields");
            }
            Err(ProfileError::TokenInvalid) => {
                return Err(self.fail_verification(started_with, AuthError::TokenInvalid).await);
            }
            Err(err @ ProfileError::Unavailable(_)) => {
                return Err(self
                    .fail_verification(started_with, AuthError::ProfileFetchFailed(err.to_string()))
                    .await);
            }
        }

        self.commit_verified(started_with, session).await
    }

    async fn commit_verified(&self, started_with: &str, session: Session) -> Result<(), AuthError> {
        let mut guard = self.inner.state.write().await;
        let unchanged =
            guard.session.as_ref().is_some_and(|current| current.access_token == started_with);
        if !unchanged {
            debug!("session changed during verification; discarding result");
            return Ok(());
        }

        self.inner.store.save_session(&session)?;
        guard.session = Some(session);
        guard.auth_state = AuthState::Authenticated;
        Ok(())
    }

    /// Clear the session for a failed check, but only if it still carries
    /// the access token the check started with. The comparison and the clear
    /// happen under one write guard.
    async fn fail_verification(&self, started_with: &str, err: AuthError) -> AuthError {
        let mut guard = self.inner.state.write().await;
        let unchanged =
            guard.session.as_ref().is_some_and(|current| current.access_token == started_with);
        if !unchanged {
            debug!(kind = err.kind(), "session changed during verification; not clearing");
            return err;
        }
        self.inner.log.record("Stored token appears invalid", Some(json!({ "error": err.kind() })));
        self.apply_failure(&mut guard, err)
    }

    /// Start a login: persist a fresh pending authorization and navigate to
    /// the provider. Returns the authorize URL.
    pub async fn login(&self, return_to: Option<String>) -> Result<String, AuthError> {
        let challenge =
            PkceChallenge::generate().map_err(|err| AuthError::Internal(err.to_string()))?;
        let pending = PendingAuthorization {
            code_verifier: challenge.code_verifier,
            state: challenge.state,
            return_to,
        };

        self.inner.store.save_pending(&pending)?;
        let url = build_authorization_url(&self.inner.oauth, &pending.code_verifier, &pending.state);

        {
            let mut guard = self.inner.state.write().await;
            guard.auth_state = AuthState::LoggingIn;
            guard.last_error = None;
        }
        self.inner.log.record(
            "Initiating Kick login",
            Some(json!({
                "redirectUri": self.inner.oauth.redirect_uri,
                "returnTo": pending.return_to,
            })),
        );
        info!("starting Kick login");

        self.inner.navigator.navigate(&url);
        Ok(url)
    }

    /// Process OAuth parameters on the current location.
    ///
    /// The parameters are stripped from the location first, so calling this
    /// again on the same page is a no-op. Returns the new session on a
    /// successful login and `None` when there was nothing to process.
    pub async fn handle_redirect(&self) -> Result<Option<Session>, AuthError> {
        let location = self.inner.navigator.current_url();
        let params = RedirectParams::from_location(&location);

        let stripped = strip_redirect_params(&location);
        if stripped != location {
            self.inner.navigator.replace_url(&stripped);
        }

        if !params.is_oauth_return() {
            return Ok(None);
        }

        self.inner.log.record(
            "Processing URL params",
            Some(json!({
                "code": if params.code.is_some() { "present" } else { "not present" },
                "error": params.error,
                "errorDescription": params.error_description,
                "state": if params.state.is_some() { "present" } else { "not present" },
            })),
        );

        if let Some(error) = params.error {
            return Err(self
                .fail(AuthError::ProviderDenied { error, description: params.error_description })
                .await);
        }

        self.set_auth_state(AuthState::LoggingIn).await;

        let pending = match self.inner.store.take_pending() {
            Ok(pending) => pending,
            Err(err) => return Err(self.fail(err.into()).await),
        };
        let code = params.code.unwrap_or_default();

        let state_matches = match (pending.state.as_deref(), params.state.as_deref()) {
            (Some(expected), Some(actual)) => validate_state(expected, actual),
            _ => false,
        };
        if !state_matches {
            self.inner.log.record(
                "OAuth state mismatch",
                Some(json!({
                    "storedState": pending.state.is_some(),
                    "receivedState": params.state.is_some(),
                })),
            );
            return Err(self.fail(AuthError::CsrfMismatch).await);
        }

        let Some(code_verifier) = pending.code_verifier else {
            return Err(self.fail(AuthError::MissingVerifier).await);
        };

        let tokens = match self.inner.exchanger.exchange_code(&code, &code_verifier).await {
            Ok(tokens) => tokens,
            Err(err) => return Err(self.fail(AuthError::TokenExchangeFailed(err)).await),
        };
        self.inner.log.record(
            "Token exchange successful",
            Some(json!({
                "hasAccessToken": true,
                "hasRefreshToken": tokens.refresh_token.is_some(),
                "tokenType": tokens.token_type,
                "expiresIn": tokens.expires_in,
            })),
        );

        let profile = match self.inner.profiles.fetch_profile(&tokens.access_token).await {
            Ok(profile) => profile,
            Err(err) => return Err(self.fail(AuthError::ProfileFetchFailed(err.to_string())).await),
        };

        let session = Session::from_parts(profile, &tokens);
        {
            let mut guard = self.inner.state.write().await;
            if let Err(err) = self.inner.store.save_session(&session) {
                let err = err.into();
                return Err(self.apply_failure(&mut guard, err));
            }
            guard.session = Some(session.clone());
            guard.auth_state = AuthState::Authenticated;
            guard.last_error = None;
        }

        let destination = pending.return_to.unwrap_or_else(|| self.inner.landing_route.clone());
        self.inner.log.record(
            "Login successful",
            Some(json!({ "username": session.username, "destination": destination })),
        );
        info!(user_id = %session.id, %destination, "login completed");

        self.inner.navigator.navigate(&destination);
        Ok(Some(session))
    }

    /// Clear the session and any pending login, then go to the login route.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.inner.log.record("Logging out", None);
        self.inner.store.clear_session()?;
        self.inner.store.clear_pending()?;

        {
            let mut guard = self.inner.state.write().await;
            guard.session = None;
            guard.auth_state = AuthState::Unauthenticated;
            guard.last_error = None;
        }
        info!("logged out");

        self.inner.navigator.navigate(LOGIN_ROUTE);
        Ok(())
    }

    async fn set_auth_state(&self, state: AuthState) {
        self.inner.state.write().await.auth_state = state;
    }

    /// Record a failure, apply its session effects and hand it back.
    async fn fail(&self, err: AuthError) -> AuthError {
        let mut guard = self.inner.state.write().await;
        self.apply_failure(&mut guard, err)
    }

    fn apply_failure(&self, state: &mut ControllerState, err: AuthError) -> AuthError {
        warn!(kind = err.kind(), severity = %err.severity(), error = %err, "auth flow failed");
        self.inner.log.record(
            "Login process error",
            Some(json!({ "kind": err.kind(), "message": err.to_string() })),
        );

        if err.clears_session() {
            if let Err(store_err) = self.inner.store.clear_session() {
                warn!(error = %store_err, "failed to clear stored session");
            }
            if let Err(store_err) = self.inner.store.clear_pending() {
                warn!(error = %store_err, "failed to clear pending authorization");
            }

            state.session = None;
            state.auth_state = AuthState::Unauthenticated;
            state.last_error = Some(err.clone());
        }

        err
    }
}
