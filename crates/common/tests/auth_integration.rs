//! Integration tests for the auth session controller
//!
//! Drives the controller through restore, login, redirect processing,
//! background verification and logout with in-memory ports, plus one
//! end-to-end login against wiremock-backed Kick endpoints.

#![cfg(feature = "test-utils")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kickstream_common::auth::{
    derive_code_challenge, parse_authorization_url, AuthError, AuthLog, AuthSessionController,
    AuthState, KeyValueStore, MemoryStore, Navigator, OAuthClient, OAuthConfig, PendingAuthorization,
    ProfileClient, ProfileError, SessionStore, StoreError, TokenExchangeError,
};
use kickstream_common::testing::{fixtures, MockNavigator, MockProfileFetcher, MockTokenExchanger};
use kickstream_common::HttpClient;
use kickstream_domain::OAuthSettings;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    controller: AuthSessionController,
    exchanger: MockTokenExchanger,
    profiles: MockProfileFetcher,
    navigator: MockNavigator,
    kv: Arc<MemoryStore>,
    store: SessionStore,
}

fn oauth_config() -> OAuthConfig {
    OAuthConfig::try_from(&OAuthSettings::default()).unwrap()
}

fn harness_with(
    location: &str,
    exchanger: MockTokenExchanger,
    profiles: MockProfileFetcher,
    kv: Arc<MemoryStore>,
) -> Harness {
    let navigator = MockNavigator::at(location);
    let store = SessionStore::new(kv.clone());
    let log = Arc::new(AuthLog::new(store.clone()));
    let controller = AuthSessionController::new(
        oauth_config(),
        Arc::new(exchanger.clone()),
        Arc::new(profiles.clone()),
        Arc::new(navigator.clone()),
        store.clone(),
        log,
    );
    Harness { controller, exchanger, profiles, navigator, kv, store }
}

fn harness(location: &str, exchanger: MockTokenExchanger, profiles: MockProfileFetcher) -> Harness {
    harness_with(location, exchanger, profiles, Arc::new(MemoryStore::new()))
}

/// Store whose deletes fail once `broken` is set.
#[derive(Default)]
struct BrokenRemoveStore {
    inner: MemoryStore,
    broken: AtomicBool,
}

impl KeyValueStore for BrokenRemoveStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Io("disk unavailable".into()));
        }
        self.inner.remove(key)
    }
}

fn save_pending(store: &SessionStore, state: &str, return_to: Option<&str>) {
    store
        .save_pending(&PendingAuthorization {
            code_verifier: "v".repeat(64),
            state: state.to_string(),
            return_to: return_to.map(str::to_string),
        })
        .unwrap();
}

/// Nothing persisted and no redirect parameters on the location.
///
/// # Test Steps
/// 1. Load on a plain `/login` location
/// 2. Verify the controller settles on `Unauthenticated`
/// 3. Verify no token or profile calls were made
#[tokio::test]
async fn fresh_load_is_unauthenticated_without_network() {
    let h = harness("/login", MockTokenExchanger::new(), MockProfileFetcher::new());

    let outcome = h.controller.on_load().await;

    assert_eq!(outcome.state, AuthState::Unauthenticated);
    assert!(outcome.verification.is_none());
    assert!(!h.controller.is_authenticated().await);
    assert_eq!(h.exchanger.exchange_count(), 0);
    assert_eq!(h.profiles.call_count(), 0);
    assert!(h.navigator.replaced().is_empty());
}

/// A persisted session is trusted immediately, then refreshed
/// from the user-info API in the background.
#[tokio::test]
async fn restored_session_is_authenticated_then_refreshed() {
    let mut fresh = fixtures::profile("streamer");
    fresh.username = "streamer_renamed".into();
    fresh.avatar_url = Some("https://files.kick.com/images/new.png".into());

    let h = harness("/dashboard", MockTokenExchanger::new(), MockProfileFetcher::returning(fresh));
    h.store.save_session(&fixtures::session("streamer", "stored-token", None)).unwrap();

    let outcome = h.controller.on_load().await;
    assert_eq!(outcome.state, AuthState::Authenticated);
    assert!(h.controller.is_authenticated().await);

    outcome.verification.expect("verification task").await.unwrap();

    let session = h.controller.session().await.unwrap();
    assert_eq!(session.username, "streamer_renamed");
    assert_eq!(session.avatar_url.as_deref(), Some("https://files.kick.com/images/new.png"));
    assert_eq!(session.access_token, "stored-token");
    assert_eq!(h.store.load_session().unwrap(), Some(session));
    assert_eq!(h.profiles.calls(), vec!["stored-token".to_string()]);
}

/// The provider redirects back with `error=access_denied`.
#[tokio::test]
async fn provider_error_clears_pending_and_skips_exchange() {
    let h = harness(
        "http://localhost:8888/login?error=access_denied&error_description=User+cancelled&state=s1",
        MockTokenExchanger::new(),
        MockProfileFetcher::new(),
    );
    save_pending(&h.store, "s1", None);

    let outcome = h.controller.on_load().await;

    assert_eq!(outcome.state, AuthState::Unauthenticated);
    let err = h.controller.last_error().await.unwrap();
    assert!(matches!(err, AuthError::ProviderDenied { ref error, .. } if error == "access_denied"));
    assert_eq!(err.user_message(), "User cancelled");
    assert_eq!(h.exchanger.exchange_count(), 0);
    assert!(!h.kv.contains_key("kickstream_oauth_state"));
    assert!(!h.kv.contains_key("kickstream_code_verifier"));
    assert_eq!(h.navigator.current_url(), "http://localhost:8888/login");
}

#[tokio::test]
async fn provider_error_without_description_uses_fallback_message() {
    let h = harness("/login?error=server_error", MockTokenExchanger::new(), MockProfileFetcher::new());

    let err = h.controller.handle_redirect().await.unwrap_err();
    assert_eq!(err.user_message(), "Failed to login with Kick. Please try again.");
}

/// A full login round trip with a return-to hint.
///
/// # Test Steps
/// 1. Start a login and capture the authorize URL
/// 2. Land on the redirect route with the code and the state from that URL
/// 3. Verify the exchange used the persisted verifier matching the challenge
/// 4. Verify the session is persisted and the user lands on the hint
#[tokio::test]
async fn valid_code_and_state_create_session() {
    let h = harness(
        "/login",
        MockTokenExchanger::returning(fixtures::tokens("access-1", Some("refresh-1"))),
        MockProfileFetcher::returning(fixtures::profile("streamer")),
    );
    h.controller.on_load().await;

    let url = h.controller.login(Some("/settings".into())).await.unwrap();
    assert_eq!(h.controller.state().await, AuthState::LoggingIn);
    assert_eq!(h.navigator.last_navigation().as_deref(), Some(url.as_str()));

    let params = parse_authorization_url(&url).unwrap();
    h.navigator.set_location(&format!("/login?code=auth-code&state={}", params.state));

    let session = h.controller.handle_redirect().await.unwrap().unwrap();

    let calls = h.exchanger.exchange_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "auth-code");
    assert_eq!(derive_code_challenge(&calls[0].1), params.code_challenge);

    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(h.store.load_session().unwrap(), Some(session));
    assert_eq!(h.controller.state().await, AuthState::Authenticated);
    assert_eq!(h.navigator.last_navigation().as_deref(), Some("/settings"));
    assert_eq!(h.navigator.current_url(), "/login");
    assert!(!h.kv.contains_key("kickstream_code_verifier"));
    assert!(!h.kv.contains_key("kickstream_return_to"));
}

#[tokio::test]
async fn login_without_hint_lands_on_dashboard() {
    let h = harness(
        "/login",
        MockTokenExchanger::returning(fixtures::tokens("access-1", None)),
        MockProfileFetcher::returning(fixtures::profile("streamer")),
    );
    let url = h.controller.login(None).await.unwrap();
    let state = parse_authorization_url(&url).unwrap().state;
    h.navigator.set_location(&format!("/login?code=c&state={state}"));

    h.controller.handle_redirect().await.unwrap();

    assert_eq!(h.navigator.last_navigation().as_deref(), Some("/dashboard"));
}

/// Any redirect state that differs from the pending one is rejected before
/// the code reaches the token endpoint.
#[tokio::test]
async fn mismatched_state_is_rejected_without_exchange() {
    let received = [
        "attacker",
        "expected",
        "expected-statf",
        "expected-state-extra",
        "EXPECTED-STATE",
        "",
    ];

    for state in received {
        let h = harness(
            &format!("/login?code=stolen&state={state}"),
            MockTokenExchanger::returning(fixtures::tokens("access-1", None)),
            MockProfileFetcher::returning(fixtures::profile("streamer")),
        );
        save_pending(&h.store, "expected-state", None);

        let outcome = h.controller.on_load().await;

        assert_eq!(outcome.state, AuthState::Unauthenticated, "state {state:?}");
        assert_eq!(h.controller.last_error().await, Some(AuthError::CsrfMismatch), "state {state:?}");
        assert_eq!(h.exchanger.exchange_count(), 0, "state {state:?}");
        assert!(h.store.load_session().unwrap().is_none());
        assert!(!h.kv.contains_key("kickstream_oauth_state"));
    }
}

#[tokio::test]
async fn redirect_without_pending_login_is_a_csrf_mismatch() {
    let h = harness("/login?code=c&state=s", MockTokenExchanger::new(), MockProfileFetcher::new());

    let err = h.controller.handle_redirect().await.unwrap_err();

    assert_eq!(err, AuthError::CsrfMismatch);
    assert_eq!(h.exchanger.exchange_count(), 0);
}

#[tokio::test]
async fn redirect_without_state_is_a_csrf_mismatch() {
    let h = harness("/login?code=c", MockTokenExchanger::new(), MockProfileFetcher::new());
    save_pending(&h.store, "s", None);

    assert_eq!(h.controller.handle_redirect().await.unwrap_err(), AuthError::CsrfMismatch);
}

#[tokio::test]
async fn missing_verifier_is_reported() {
    let h = harness("/login?code=c&state=s", MockTokenExchanger::new(), MockProfileFetcher::new());
    save_pending(&h.store, "s", None);
    h.kv.remove("kickstream_code_verifier").unwrap();

    let err = h.controller.handle_redirect().await.unwrap_err();

    assert_eq!(err, AuthError::MissingVerifier);
    assert_eq!(h.exchanger.exchange_count(), 0);
    assert!(!h.kv.contains_key("kickstream_oauth_state"));
}

#[tokio::test]
async fn token_exchange_failure_surfaces_and_clears_pending() {
    let exchanger = MockTokenExchanger::new();
    exchanger.push_exchange(Err(TokenExchangeError::Status {
        status: 400,
        body: r#"{"error":"invalid_grant"}"#.into(),
    }));
    let h = harness("/login?code=c&state=s", exchanger, MockProfileFetcher::new());
    save_pending(&h.store, "s", None);

    let err = h.controller.handle_redirect().await.unwrap_err();

    assert!(matches!(err, AuthError::TokenExchangeFailed(TokenExchangeError::Status { status: 400, .. })));
    assert_eq!(h.controller.state().await, AuthState::Unauthenticated);
    assert_eq!(h.profiles.call_count(), 0);
    assert!(!h.kv.contains_key("kickstream_code_verifier"));
}

#[tokio::test]
async fn profile_failure_after_exchange_creates_no_session() {
    let h = harness(
        "/login?code=c&state=s",
        MockTokenExchanger::returning(fixtures::tokens("access-1", None)),
        MockProfileFetcher::failing(ProfileError::Unavailable("no shape".into())),
    );
    save_pending(&h.store, "s", None);

    let err = h.controller.handle_redirect().await.unwrap_err();

    assert!(matches!(err, AuthError::ProfileFetchFailed(_)));
    assert!(h.store.load_session().unwrap().is_none());
}

/// Processing a location twice only acts once; a clean location is a no-op.
#[tokio::test]
async fn redirect_processing_is_idempotent() {
    let h = harness(
        "/login?code=c&state=s",
        MockTokenExchanger::returning(fixtures::tokens("access-1", None)),
        MockProfileFetcher::returning(fixtures::profile("streamer")),
    );
    save_pending(&h.store, "s", None);

    assert!(h.controller.handle_redirect().await.unwrap().is_some());
    assert_eq!(h.controller.handle_redirect().await.unwrap(), None);
    assert_eq!(h.exchanger.exchange_count(), 1);

    let clean = harness("/login", MockTokenExchanger::new(), MockProfileFetcher::new());
    assert_eq!(clean.controller.handle_redirect().await.unwrap(), None);
    assert_eq!(clean.controller.handle_redirect().await.unwrap(), None);
    assert!(clean.navigator.replaced().is_empty());
    assert_eq!(clean.controller.state().await, AuthState::Uninitialized);
}

/// The stored token is rejected during background verification.
#[tokio::test]
async fn unauthorized_verification_clears_session() {
    let h = harness(
        "/dashboard",
        MockTokenExchanger::new(),
        MockProfileFetcher::failing(ProfileError::TokenInvalid),
    );
    h.store.save_session(&fixtures::session("streamer", "expired", None)).unwrap();

    let outcome = h.controller.on_load().await;
    assert_eq!(outcome.state, AuthState::Authenticated);
    outcome.verification.unwrap().await.unwrap();

    assert_eq!(h.controller.state().await, AuthState::Unauthenticated);
    assert!(h.controller.session().await.is_none());
    assert!(h.store.load_session().unwrap().is_none());
    assert_eq!(h.controller.last_error().await, Some(AuthError::TokenInvalid));
    assert!(h.exchanger.refresh_calls().is_empty());
}

#[tokio::test]
async fn transient_verification_failure_keeps_session_silently() {
    let h = harness(
        "/dashboard",
        MockTokenExchanger::new(),
        MockProfileFetcher::failing(ProfileError::Transport("timed out".into())),
    );
    let stored = fixtures::session("streamer", "tok", None);
    h.store.save_session(&stored).unwrap();
    h.controller.restore().await;

    let err = h.controller.verify_session().await.unwrap_err();

    assert!(matches!(err, AuthError::TransientVerificationFailure(_)));
    assert!(h.controller.is_authenticated().await);
    assert_eq!(h.controller.last_error().await, None);
    assert_eq!(h.store.load_session().unwrap(), Some(stored));
}

#[tokio::test]
async fn rejected_token_is_refreshed_once() {
    let exchanger = MockTokenExchanger::new();
    exchanger.push_refresh(Ok(fixtures::tokens("access-2", Some("refresh-2"))));
    let profiles = MockProfileFetcher::new();
    profiles.push(Err(ProfileError::TokenInvalid));
    profiles.push(Ok(fixtures::profile("streamer")));

    let h = harness("/dashboard", exchanger, profiles);
    h.store.save_session(&fixtures::session("streamer", "access-1", Some("refresh-1"))).unwrap();
    h.controller.restore().await;

    h.controller.verify_session().await.unwrap();

    assert_eq!(h.exchanger.refresh_calls(), vec!["refresh-1".to_string()]);
    assert_eq!(h.profiles.calls(), vec!["access-1".to_string(), "access-2".to_string()]);
    let session = h.store.load_session().unwrap().unwrap();
    assert_eq!(session.access_token, "access-2");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-2"));
    assert!(h.controller.is_authenticated().await);
}

#[tokio::test]
async fn failed_refresh_clears_session() {
    let exchanger = MockTokenExchanger::new();
    exchanger.push_refresh(Err(TokenExchangeError::Status {
        status: 400,
        body: r#"{"error":"invalid_grant"}"#.into(),
    }));
    let h = harness("/dashboard", exchanger, MockProfileFetcher::failing(ProfileError::TokenInvalid));
    h.store.save_session(&fixtures::session("streamer", "access-1", Some("refresh-1"))).unwrap();
    h.controller.restore().await;

    let err = h.controller.verify_session().await.unwrap_err();

    assert_eq!(err, AuthError::TokenInvalid);
    assert!(h.store.load_session().unwrap().is_none());
    assert_eq!(h.controller.state().await, AuthState::Unauthenticated);
}

/// A redirect code on load wins over background verification.
#[tokio::test]
async fn code_on_load_skips_background_verification() {
    let h = harness(
        "/login?code=c&state=s",
        MockTokenExchanger::returning(fixtures::tokens("new-token", None)),
        MockProfileFetcher::returning(fixtures::profile("streamer")),
    );
    h.store.save_session(&fixtures::session("old_user", "old-token", None)).unwrap();
    save_pending(&h.store, "s", None);

    let outcome = h.controller.on_load().await;

    assert!(outcome.verification.is_none());
    assert_eq!(outcome.state, AuthState::Authenticated);
    assert_eq!(h.profiles.calls(), vec!["new-token".to_string()]);
    assert_eq!(h.controller.session().await.unwrap().access_token, "new-token");
}

/// A verification that started against an older session must not clear a
/// session that replaced it in the meantime.
#[tokio::test]
async fn stale_verification_does_not_clobber_fresher_session() {
    let profiles = MockProfileFetcher::failing(ProfileError::TokenInvalid)
        .with_delay(Duration::from_millis(100));
    let h = harness("/dashboard", MockTokenExchanger::new(), profiles);
    h.store.save_session(&fixtures::session("streamer", "old-token", None)).unwrap();
    h.controller.restore().await;

    let verification = h.controller.spawn_verification();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let fresher = fixtures::session("streamer", "new-token", None);
    h.store.save_session(&fresher).unwrap();
    h.controller.restore().await;

    verification.await.unwrap();

    assert_eq!(h.profiles.calls(), vec!["old-token".to_string()]);
    assert_eq!(h.controller.session().await, Some(fresher.clone()));
    assert_eq!(h.store.load_session().unwrap(), Some(fresher));
    assert_eq!(h.controller.last_error().await, None);
}

/// A login that lands while a stale check is in flight keeps its session.
#[tokio::test]
async fn redirect_during_failing_verification_keeps_new_session() {
    let profiles = MockProfileFetcher::new()
        .with_delay_on("old-token", Duration::from_millis(100));
    profiles.push(Ok(fixtures::profile("streamer")));
    profiles.push(Err(ProfileError::TokenInvalid));
    let h = harness(
        "/dashboard",
        MockTokenExchanger::returning(fixtures::tokens("new-token", None)),
        profiles,
    );
    h.store.save_session(&fixtures::session("streamer", "old-token", None)).unwrap();
    h.controller.restore().await;
    save_pending(&h.store, "s", None);

    let verification = h.controller.spawn_verification();
    tokio::time::sleep(Duration::from_millis(10)).await;

    h.navigator.set_location("/login?code=c&state=s");
    let session = h.controller.handle_redirect().await.unwrap().unwrap();
    assert_eq!(session.access_token, "new-token");

    verification.await.unwrap();

    assert_eq!(h.profiles.calls(), vec!["old-token".to_string(), "new-token".to_string()]);
    assert_eq!(h.controller.state().await, AuthState::Authenticated);
    assert_eq!(h.controller.session().await, Some(session.clone()));
    assert_eq!(h.store.load_session().unwrap(), Some(session));
    assert_eq!(h.controller.last_error().await, None);
}

/// A store failure while consuming the pending login is surfaced and
/// leaves the controller logged out rather than stuck mid-login.
#[tokio::test]
async fn unreadable_pending_login_is_surfaced() {
    let kv = Arc::new(BrokenRemoveStore::default());
    let store = SessionStore::new(kv.clone());
    save_pending(&store, "s", None);
    kv.broken.store(true, Ordering::SeqCst);

    let exchanger = MockTokenExchanger::returning(fixtures::tokens("access-1", None));
    let navigator = MockNavigator::at("/login?code=c&state=s");
    let log = Arc::new(AuthLog::new(store.clone()));
    let controller = AuthSessionController::new(
        oauth_config(),
        Arc::new(exchanger.clone()),
        Arc::new(MockProfileFetcher::returning(fixtures::profile("streamer"))),
        Arc::new(navigator.clone()),
        store,
        log.clone(),
    );

    let err = controller.handle_redirect().await.unwrap_err();

    assert!(matches!(err, AuthError::Storage(_)));
    assert_eq!(controller.state().await, AuthState::Unauthenticated);
    assert_eq!(controller.last_error().await, Some(err));
    assert_eq!(exchanger.exchange_count(), 0);
    assert!(log.entries().iter().any(|e| e.message == "Login process error"));
    assert_eq!(navigator.current_url(), "/login");
}

#[tokio::test]
async fn second_login_overwrites_pending_authorization() {
    let h = harness(
        "/login",
        MockTokenExchanger::returning(fixtures::tokens("access-1", None)),
        MockProfileFetcher::returning(fixtures::profile("streamer")),
    );
    let first = parse_authorization_url(&h.controller.login(None).await.unwrap()).unwrap();
    let second = parse_authorization_url(&h.controller.login(None).await.unwrap()).unwrap();
    assert_ne!(first.state, second.state);

    h.navigator.set_location(&format!("/login?code=c&state={}", first.state));
    assert_eq!(h.controller.handle_redirect().await.unwrap_err(), AuthError::CsrfMismatch);
}

#[tokio::test]
async fn logout_clears_everything_and_goes_to_login() {
    let h = harness("/dashboard", MockTokenExchanger::new(), MockProfileFetcher::new());
    h.store.save_session(&fixtures::session("streamer", "tok", None)).unwrap();
    save_pending(&h.store, "s", Some("/settings"));
    h.controller.restore().await;

    h.controller.logout().await.unwrap();

    assert_eq!(h.controller.state().await, AuthState::Unauthenticated);
    assert!(h.store.load_session().unwrap().is_none());
    assert!(!h.kv.contains_key("kickstream_oauth_state"));
    assert!(!h.kv.contains_key("kickstream_return_to"));
    assert_eq!(h.navigator.last_navigation().as_deref(), Some("/login"));
}

#[tokio::test]
async fn auth_log_records_flow_and_stays_bounded() {
    let h = harness("/login", MockTokenExchanger::new(), MockProfileFetcher::new());
    for _ in 0..15 {
        h.controller.on_load().await;
    }

    let entries = h.controller.auth_log().entries();
    assert_eq!(entries.len(), 20);
    assert!(entries.iter().any(|e| e.message == "Checking auth status"));

    let persisted = h.store.load_logs().unwrap();
    assert_eq!(persisted.len(), 20);
}

/// End-to-end login against wiremock-backed token and profile endpoints.
#[tokio::test]
async fn login_round_trip_against_http_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=live-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "live-access",
            "refresh_token": "live-refresh",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/user/me"))
        .and(header("authorization", "Bearer live-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 987, "username": "live_streamer", "verified": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = OAuthSettings::default();
    settings.token_url = format!("{}/oauth/token", server.uri());
    let http = HttpClient::builder()
        .timeout(Duration::from_secs(2))
        .base_backoff(Duration::from_millis(5))
        .build()
        .unwrap();
    let config = OAuthConfig::try_from(&settings).unwrap();
    let oauth = OAuthClient::new(config.clone(), http.clone());
    let profiles = ProfileClient::new(http, vec![format!("{}/api/v2/user/me", server.uri())]);

    let kv = Arc::new(MemoryStore::new());
    let store = SessionStore::new(kv);
    let navigator = MockNavigator::at("http://localhost:8888/login");
    let controller = AuthSessionController::new(
        config,
        Arc::new(oauth),
        Arc::new(profiles),
        Arc::new(navigator.clone()),
        store.clone(),
        Arc::new(AuthLog::new(store.clone())),
    );

    let url = controller.login(None).await.unwrap();
    let state = parse_authorization_url(&url).unwrap().state;
    navigator.set_location(&format!("http://localhost:8888/login?code=live-code&state={state}"));

    let session = controller.handle_redirect().await.unwrap().unwrap();

    assert_eq!(session.id, "987");
    assert_eq!(session.username, "live_streamer");
    assert_eq!(session.refresh_token.as_deref(), Some("live-refresh"));
    assert_eq!(session.verified, Some(true));
    assert_eq!(store.load_session().unwrap(), Some(session));
}
