//! Loopback HTTP server that receives the OAuth redirect.
//!
//! The listener performs no validation of its own: whatever arrives on the
//! redirect path (`code`, `state`, `error`, `error_description`) is handed to
//! the caller as a full URL, and the controller decides what it means.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{OriginalUri, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use kickstream_common::auth::RedirectParams;
use kickstream_domain::{KickStreamError, Result};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use url::Url;

use crate::errors::InfraError;

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>KickStream Helper</title></head>
<body><h1>Login received</h1><p>You can close this window and return to the terminal.</p></body>
</html>"#;

const FAILURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>KickStream Helper</title></head>
<body><h1>Login was not completed</h1><p>Return to the terminal for details.</p></body>
</html>"#;

#[derive(Clone)]
struct CallbackState {
    origin: String,
    sender: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

/// Loopback server bound to the host and port of the redirect URI.
pub struct CallbackListener {
    local_addr: SocketAddr,
    redirect_path: String,
    receiver: Option<oneshot::Receiver<String>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Bind the listener for `redirect_uri`. `localhost` binds to the IPv4
    /// loopback address; a port of `0` picks an ephemeral port.
    ///
    /// # Errors
    /// Returns `KickStreamError::Config` for an unusable redirect URI and
    /// `KickStreamError::Network` if the address cannot be bound.
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let url = Url::parse(redirect_uri)
            .map_err(|err| KickStreamError::Config(format!("invalid redirect URI: {err}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| KickStreamError::Config("redirect URI has no host".into()))?;
        let port = url.port_or_known_default().unwrap_or(80);
        let bind_host = if host == "localhost" { Ipv4Addr::LOCALHOST.to_string() } else { host.to_string() };

        let listener = TcpListener::bind((bind_host.as_str(), port)).await.map_err(|err| {
            warn!(%host, port, error = %err, "failed to bind redirect listener");
            InfraError::from(err)
        })?;
        let local_addr = listener.local_addr().map_err(InfraError::from)?;

        let redirect_path = url.path().to_string();
        let (sender, receiver) = oneshot::channel();
        let state = CallbackState {
            origin: format!("{}://{}", url.scheme(), url.authority()),
            sender: Arc::new(Mutex::new(Some(sender))),
        };

        let app = Router::new().route(&redirect_path, get(handle_redirect)).with_state(state);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "redirect listener failed");
            }
        });

        info!(addr = %local_addr, path = %redirect_path, "waiting for OAuth redirect");
        Ok(Self {
            local_addr,
            redirect_path,
            receiver: Some(receiver),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub fn redirect_path(&self) -> &str {
        &self.redirect_path
    }

    /// Wait for the first request on the redirect path and return its full
    /// URL.
    ///
    /// # Errors
    /// Returns `KickStreamError::Network` on timeout, and
    /// `KickStreamError::Internal` if called twice or the server stopped.
    pub async fn wait_for_redirect(&mut self, timeout: Duration) -> Result<String> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| KickStreamError::Internal("redirect already consumed".into()))?;

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(url)) => Ok(url),
            Ok(Err(_)) => Err(KickStreamError::Internal("redirect listener stopped".into())),
            Err(_) => Err(KickStreamError::Network(format!(
                "no OAuth redirect received within {}s",
                timeout.as_secs()
            ))),
        }
    }

    /// Stop the server gracefully.
    ///
    /// # Errors
    /// Returns `KickStreamError::Internal` if the server task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(KickStreamError::Internal(format!(
                        "redirect listener panicked: {err}"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_redirect(
    State(state): State<CallbackState>,
    OriginalUri(uri): OriginalUri,
) -> Html<&'static str> {
    let full_url = format!("{}{}", state.origin, uri);
    let params = RedirectParams::from_location(&full_url);

    match state.sender.lock().take() {
        Some(sender) => {
            let _ = sender.send(full_url);
        }
        None => warn!("ignoring repeated request on the redirect path"),
    }

    if params.code.is_some() && params.error.is_none() {
        Html(SUCCESS_PAGE)
    } else {
        Html(FAILURE_PAGE)
    }
}
