//! Token relay server
//!
//! Holds the client secret on the server side. Clients POST the relay body
//! (`code`, `code_verifier`, `redirect_uri`, or a refresh grant) to
//! `/kick-auth`; the relay adds `client_id` and `client_secret`, calls the
//! provider token endpoint with a form body and returns the provider JSON.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use kickstream_common::HttpClient;
use kickstream_domain::{Config, KickStreamError};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::errors::InfraError;

/// Relay request body. Either an authorization-code exchange or a
/// `grant_type = "refresh_token"` request.
#[derive(Debug, Default, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub grant_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub code_verifier: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("No authorization code provided")]
    MissingCode,

    #[error("No refresh token provided")]
    MissingRefreshToken,

    /// The provider refused the grant; its 4xx status is passed through.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Provider unreachable, failing with 5xx, or answering garbage.
    #[error("{0}")]
    Provider(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidBody(_) | Self::MissingCode | Self::MissingRefreshToken => {
                StatusCode::BAD_REQUEST
            }
            Self::Rejected { status, .. } => status,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

/// Server-side relay configuration.
#[derive(Clone)]
pub struct RelayState {
    http: HttpClient,
    client_id: String,
    client_secret: Option<String>,
    token_url: String,
    default_redirect_uri: String,
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("client_id", &self.client_id)
            .field("has_client_secret", &self.client_secret.is_some())
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl RelayState {
    #[must_use]
    pub fn new(
        http: HttpClient,
        client_id: impl Into<String>,
        client_secret: Option<String>,
        token_url: impl Into<String>,
        default_redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.filter(|s| !s.is_empty()),
            token_url: token_url.into(),
            default_redirect_uri: default_redirect_uri.into(),
        }
    }

    /// Relay state from the loaded configuration.
    ///
    /// # Errors
    /// Returns `KickStreamError::Config` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, KickStreamError> {
        let http = HttpClient::from_settings(&config.http)
            .map_err(|err| KickStreamError::Config(err.to_string()))?;
        if config.oauth.client_secret.is_none() {
            warn!("relay started without a client secret; the provider may reject exchanges");
        }
        Ok(Self::new(
            http,
            config.oauth.client_id.clone(),
            config.oauth.client_secret.clone(),
            config.oauth.token_url.clone(),
            config.oauth.redirect_uri.clone(),
        ))
    }

    fn form_for(&self, request: &RelayRequest) -> Result<Vec<(&'static str, String)>, RelayError> {
        let mut form = vec![("client_id", self.client_id.clone())];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        if request.grant_type.as_deref() == Some("refresh_token") {
            let refresh_token = request
                .refresh_token
                .clone()
                .filter(|t| !t.is_empty())
                .ok_or(RelayError::MissingRefreshToken)?;
            form.push(("grant_type", "refresh_token".into()));
            form.push(("refresh_token", refresh_token));
            return Ok(form);
        }

        let code = request.code.clone().filter(|c| !c.is_empty()).ok_or(RelayError::MissingCode)?;
        let redirect_uri = request
            .redirect_uri
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| self.default_redirect_uri.clone());

        form.push(("grant_type", "authorization_code".into()));
        form.push(("redirect_uri", redirect_uri));
        form.push(("code", code));
        if let Some(verifier) = request.code_verifier.clone().filter(|v| !v.is_empty()) {
            form.push(("code_verifier", verifier));
        }
        Ok(form)
    }
}

/// Router exposing `POST /kick-auth` and `GET /health`.
pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/kick-auth", post(exchange).options(preflight))
        .route("/health", get(health))
        .layer(map_response(with_cors))
        .with_state(state)
}

/// Serve the relay until the process is stopped.
///
/// # Errors
/// Returns `KickStreamError::Network` if the address cannot be bound or the
/// server fails.
pub async fn serve(addr: SocketAddr, state: RelayState) -> Result<(), KickStreamError> {
    let listener = TcpListener::bind(addr).await.map_err(|err| {
        error!(%addr, error = %err, "failed to bind token relay");
        InfraError::from(err)
    })?;
    info!(%addr, "token relay listening");

    axum::serve(listener, relay_router(state))
        .await
        .map_err(|err| KickStreamError::Network(format!("relay server error: {err}")))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("authorization, x-client-info, apikey, content-type"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
    response
}

async fn exchange(
    State(state): State<RelayState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<Value>, RelayError> {
    let Json(request) = payload?;
    let form = state.form_for(&request)?;
    let grant = if request.grant_type.as_deref() == Some("refresh_token") {
        "refresh_token"
    } else {
        "authorization_code"
    };
    info!(
        grant,
        has_code_verifier = request.code_verifier.is_some(),
        has_client_secret = state.client_secret.is_some(),
        "relaying token request"
    );

    let builder = state
        .http
        .request(Method::POST, &state.token_url)
        .header(ACCEPT, "application/json")
        .form(&form);
    let response = state.http.send(builder).await.map_err(|err| {
        error!(error = %err, "token endpoint unreachable");
        RelayError::Provider(format!("Failed to reach token endpoint: {err}"))
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| RelayError::Provider(format!("Failed to read token response: {err}")))?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "token endpoint rejected relayed request");
        let message = format!("Failed to exchange token: {} {}", status.as_u16(), body);
        if status.is_client_error() {
            let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_REQUEST);
            return Err(RelayError::Rejected { status, message });
        }
        return Err(RelayError::Provider(message));
    }

    let data: Value = serde_json::from_str(&body)
        .map_err(|_| RelayError::Provider(format!("Invalid response format: {body}")))?;
    let has_access_token =
        data.get("access_token").and_then(Value::as_str).is_some_and(|t| !t.is_empty());
    if !has_access_token {
        return Err(RelayError::Provider("No access token received from Kick".into()));
    }

    info!(
        has_refresh_token = data.get("refresh_token").is_some(),
        scope = ?data.get("scope").and_then(serde_json::Value::as_str),
        "token relay succeeded"
    );
    Ok(Json(data))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn state(token_url: String) -> RelayState {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(2))
            .base_backoff(Duration::from_millis(5))
            .build()
            .unwrap();
        RelayState::new(
            http,
            "client-123",
            Some("server-secret".into()),
            token_url,
            "http://localhost:8888/login",
        )
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/kick-auth")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn relays_code_exchange_with_server_side_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("client_id=client-123"))
            .and(body_string_contains("client_secret=server-secret"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("code_verifier=verifier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at", "refresh_token": "rt", "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = relay_router(state(format!("{}/oauth/token", server.uri())));
        let response = app
            .oneshot(post_json(json!({ "code": "abc", "code_verifier": "verifier" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = json_body(response).await;
        assert_eq!(body["access_token"], "at");
        assert!(body.get("client_secret").is_none());
    }

    #[tokio::test]
    async fn falls_back_to_configured_redirect_uri() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("redirect_uri=http%3A%2F%2Flocalhost%3A8888%2Flogin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "at" })))
            .expect(1)
            .mount(&server)
            .await;

        let app = relay_router(state(server.uri()));
        let response = app.oneshot(post_json(json!({ "code": "abc" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn relays_refresh_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "at-2" })))
            .expect(1)
            .mount(&server)
            .await;

        let app = relay_router(state(server.uri()));
        let response = app
            .oneshot(post_json(json!({ "grant_type": "refresh_token", "refresh_token": "rt-1" })))
            .await
            .unwrap();

        assert_eq!(json_body(response).await["access_token"], "at-2");
    }

    #[tokio::test]
    async fn missing_code_is_bad_request() {
        let app = relay_router(state("http://127.0.0.1:9/never".into()));
        let response = app.oneshot(post_json(json!({ "code_verifier": "v" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No authorization code provided");
    }

    #[tokio::test]
    async fn provider_rejection_keeps_client_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let app = relay_router(state(server.uri()));
        let response = app.oneshot(post_json(json!({ "code": "stale" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = json_body(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("400"));
        assert!(error.contains("invalid_grant"));
    }

    #[tokio::test]
    async fn provider_unauthorized_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_client"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let app = relay_router(state(server.uri()));
        let response = app
            .oneshot(post_json(json!({ "grant_type": "refresh_token", "refresh_token": "rt" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn provider_server_error_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let app = relay_router(state(server.uri()));
        let response = app.oneshot(post_json(json!({ "code": "abc" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let error = json_body(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("503"));
    }

    #[tokio::test]
    async fn response_without_access_token_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "Bearer" })))
            .mount(&server)
            .await;

        let app = relay_router(state(server.uri()));
        let response = app.oneshot(post_json(json!({ "code": "abc" }))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = relay_router(state("http://127.0.0.1:9/never".into()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[test]
    fn debug_output_hides_secret() {
        let rendered = format!("{:?}", state("http://example.com".into()));
        assert!(!rendered.contains("server-secret"));
    }
}
