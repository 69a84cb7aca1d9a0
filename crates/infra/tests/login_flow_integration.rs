//! End-to-end terminal login
//!
//! Runs the real pieces together: the token relay in front of a mocked Kick
//! token endpoint, the loopback redirect listener, the JSON file store and
//! the controller built from configuration.

use std::sync::Arc;
use std::time::Duration;

use kickstream_common::auth::{
    parse_authorization_url, AuthError, AuthLog, AuthSessionController, AuthState, MemoryStore,
    OAuthClient, OAuthConfig, ProfileError, SessionStore,
};
use kickstream_common::testing::{fixtures, MockNavigator, MockProfileFetcher};
use kickstream_common::HttpClient;
use kickstream_domain::{Config, TokenEndpointMode};
use kickstream_infra::{build_controller, relay_router, CallbackListener, RelayState};
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_kick() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("client_secret=relay-secret"))
        .and(body_string_contains("code=browser-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "kick-access",
            "refresh_token": "kick-refresh",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "user:read"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user"))
        .and(header("authorization", "Bearer kick-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "user_id": 4242, "name": "relay_streamer", "email": "r@example.com" }]
        })))
        .mount(&server)
        .await;
    server
}

async fn start_relay(token_url: String) -> String {
    let http = HttpClient::builder().timeout(Duration::from_secs(2)).build().unwrap();
    let state = RelayState::new(
        http,
        "client-123",
        Some("relay-secret".into()),
        token_url,
        "http://127.0.0.1:0/login",
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, relay_router(state)).await.unwrap();
    });
    format!("http://{addr}/kick-auth")
}

fn config(dir: &TempDir, kick: &MockServer, relay_url: String) -> Config {
    let mut config = Config::default();
    config.oauth.client_id = "client-123".into();
    config.oauth.redirect_uri = "http://127.0.0.1:0/login".into();
    config.oauth.token_mode = TokenEndpointMode::Relay;
    config.oauth.relay_url = Some(relay_url);
    config.profile.endpoints = vec![format!("{}/api/v1/user", kick.uri())];
    config.http.timeout_secs = 2;
    config.http.retry_backoff_ms = 5;
    config.storage.path = dir.path().join("kickstream-store.json");
    config
}

#[tokio::test]
async fn terminal_login_through_relay_and_loopback_listener() {
    let kick = mock_kick().await;
    let relay_url = start_relay(format!("{}/oauth/token", kick.uri())).await;
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &kick, relay_url);

    let runtime = build_controller(&config).unwrap();
    runtime.controller.on_load().await;

    let mut listener = CallbackListener::bind(&config.oauth.redirect_uri).await.unwrap();
    let authorize_url = runtime.controller.login(Some("/links".into())).await.unwrap();
    let state = parse_authorization_url(&authorize_url).unwrap().state;

    // The browser follows the provider redirect to the loopback listener.
    let page = reqwest::get(format!(
        "http://{}/login?code=browser-code&state={state}",
        listener.local_addr()
    ))
    .await
    .unwrap()
    .text()
    .await
    .unwrap();
    assert!(page.contains("Login received"));

    let redirect = listener.wait_for_redirect(Duration::from_secs(2)).await.unwrap();
    listener.shutdown().await.unwrap();
    runtime.navigator.set_location(redirect);

    let session = runtime.controller.handle_redirect().await.unwrap().unwrap();
    assert_eq!(session.id, "4242");
    assert_eq!(session.username, "relay_streamer");
    assert_eq!(session.access_token, "kick-access");
    assert_eq!(runtime.navigator.last_navigation().as_deref(), Some("/links"));

    let on_disk = std::fs::read_to_string(&config.storage.path).unwrap();
    assert!(on_disk.contains("relay_streamer"));
    assert!(!on_disk.contains("kickstream_code_verifier"));

    // A second process restores the session from the same file.
    let restarted = build_controller(&config).unwrap();
    let outcome = restarted.controller.on_load().await;
    assert_eq!(outcome.state, AuthState::Authenticated);
    outcome.verification.unwrap().await.unwrap();
    assert!(restarted.controller.is_authenticated().await);
}

#[tokio::test]
async fn pasted_redirect_with_foreign_state_is_rejected() {
    let kick = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = config(&dir, &kick, "http://127.0.0.1:9/kick-auth".into());

    let runtime = build_controller(&config).unwrap();
    runtime.controller.login(None).await.unwrap();
    runtime.navigator.set_location("http://127.0.0.1:0/login?code=browser-code&state=forged");

    let err = runtime.controller.handle_redirect().await.unwrap_err();

    assert_eq!(err.user_message(), "Authentication failed due to security mismatch. Please try again.");
    assert_eq!(runtime.controller.state().await, AuthState::Unauthenticated);
    assert!(runtime.store.load_pending().unwrap().state.is_none());
}

/// A refresh token the provider no longer accepts ends the session instead
/// of being treated as an outage, and is sent upstream only once.
#[tokio::test]
async fn revoked_refresh_through_relay_clears_session() {
    let kick = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=revoked-refresh"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":"invalid_grant","error_description":"revoked"}"#),
        )
        .expect(1)
        .mount(&kick)
        .await;
    let relay_url = start_relay(format!("{}/oauth/token", kick.uri())).await;

    let mut settings = Config::default().oauth;
    settings.token_mode = TokenEndpointMode::Relay;
    settings.relay_url = Some(relay_url);
    let oauth = OAuthConfig::try_from(&settings).unwrap();
    let http = HttpClient::builder()
        .timeout(Duration::from_secs(2))
        .max_attempts(2)
        .base_backoff(Duration::from_millis(5))
        .build()
        .unwrap();

    let store = SessionStore::new(Arc::new(MemoryStore::new()));
    store
        .save_session(&fixtures::session("streamer", "expired-access", Some("revoked-refresh")))
        .unwrap();
    let controller = AuthSessionController::new(
        oauth.clone(),
        Arc::new(OAuthClient::new(oauth, http)),
        Arc::new(MockProfileFetcher::failing(ProfileError::TokenInvalid)),
        Arc::new(MockNavigator::at("/dashboard")),
        store.clone(),
        Arc::new(AuthLog::new(store.clone())),
    );

    let outcome = controller.on_load().await;
    assert_eq!(outcome.state, AuthState::Authenticated);
    outcome.verification.unwrap().await.unwrap();

    assert_eq!(controller.state().await, AuthState::Unauthenticated);
    assert!(controller.session().await.is_none());
    assert!(store.load_session().unwrap().is_none());
    assert_eq!(controller.last_error().await, Some(AuthError::TokenInvalid));
    assert_eq!(kick.received_requests().await.unwrap().len(), 1);
}
