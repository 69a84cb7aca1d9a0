//! Wires the auth session controller from a loaded [`Config`].

use std::sync::Arc;

use kickstream_common::auth::{
    AuthLog, AuthSessionController, OAuthClient, OAuthConfig, ProfileClient, SessionStore,
};
use kickstream_common::HttpClient;
use kickstream_domain::{Config, KickStreamError};
use tracing::info;

use crate::callback::TerminalNavigator;
use crate::errors::InfraError;
use crate::storage::FileStore;

/// Controller plus the handles a terminal front end needs next to it.
#[derive(Debug, Clone)]
pub struct AuthRuntime {
    pub controller: AuthSessionController,
    pub navigator: TerminalNavigator,
    pub store: SessionStore,
    pub oauth: OAuthConfig,
}

/// Build the production controller: reqwest-backed token and profile
/// clients, the JSON file store and a terminal navigator parked on the
/// landing route.
///
/// # Errors
/// Returns `KickStreamError::Config` for an unusable OAuth or HTTP
/// configuration and `KickStreamError::Storage` if the store directory
/// cannot be created.
pub fn build_controller(config: &Config) -> Result<AuthRuntime, KickStreamError> {
    let http = HttpClient::from_settings(&config.http).map_err(InfraError::from)?;
    let oauth = OAuthConfig::try_from(&config.oauth)?;

    let exchanger = OAuthClient::new(oauth.clone(), http.clone());
    let profiles = ProfileClient::new(http, config.profile.endpoints.clone())
        .with_placeholder_fallback(config.profile.placeholder_fallback);

    let file_store = FileStore::open(config.storage.path.clone()).map_err(InfraError::from)?;
    let store = SessionStore::new(Arc::new(file_store));
    let log = Arc::new(AuthLog::new(store.clone()));
    let navigator = TerminalNavigator::new(config.callback.landing_route.clone());

    let controller = AuthSessionController::new(
        oauth.clone(),
        Arc::new(exchanger),
        Arc::new(profiles),
        Arc::new(navigator.clone()),
        store.clone(),
        log,
    )
    .with_landing_route(config.callback.landing_route.clone());

    info!(
        token_mode = %config.oauth.token_mode,
        store = %config.storage.path.display(),
        placeholder_profile = config.profile.placeholder_fallback,
        "auth controller ready"
    );
    Ok(AuthRuntime { controller, navigator, store, oauth })
}
