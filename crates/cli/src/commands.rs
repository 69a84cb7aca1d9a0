//! Command execution.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use kickstream_common::auth::{AuthError, Session};
use kickstream_domain::Config;
use kickstream_infra::relay::{self, RelayState};
use kickstream_infra::{build_controller, config, AuthRuntime, CallbackListener};
use tracing::{info, warn};

use crate::cli::{Cli, Command};

pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = config::load(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Login { return_to, timeout } => login(&config, return_to, timeout).await,
        Command::Callback { url } => callback(&config, url).await,
        Command::Status => status(&config).await,
        Command::Logout => logout(&config).await,
        Command::Logs { json } => logs(&config, json),
        Command::Relay { bind } => relay_server(&config, bind).await,
    }
}

fn runtime(config: &Config) -> anyhow::Result<AuthRuntime> {
    build_controller(config).context("failed to set up the auth controller")
}

async fn login(
    config: &Config,
    return_to: Option<String>,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    let runtime = runtime(config)?;
    runtime.controller.restore().await;

    // Listen before handing out the URL so a fast redirect is not missed.
    let mut listener = CallbackListener::bind(&config.oauth.redirect_uri)
        .await
        .context("failed to start the redirect listener")?;

    let url = runtime.controller.login(return_to).await.map_err(user_facing)?;
    println!("Open this URL in your browser to log in with Kick:\n\n  {url}\n");

    let wait = Duration::from_secs(timeout.unwrap_or(config.callback.timeout_secs));
    let redirect = listener.wait_for_redirect(wait).await;
    if let Err(err) = listener.shutdown().await {
        warn!(error = %err, "redirect listener did not shut down cleanly");
    }
    let redirect = redirect
        .context("no redirect received; paste it with `kickstream callback <URL>` instead")?;

    finish_redirect(&runtime, redirect).await
}

async fn callback(config: &Config, url: String) -> anyhow::Result<()> {
    let runtime = runtime(config)?;
    runtime.controller.restore().await;
    finish_redirect(&runtime, url).await
}

async fn finish_redirect(runtime: &AuthRuntime, redirect: String) -> anyhow::Result<()> {
    runtime.navigator.set_location(redirect);

    match runtime.controller.handle_redirect().await {
        Ok(Some(session)) => {
            print_session(&session);
            if let Some(destination) = runtime.navigator.last_navigation() {
                println!("Continue at: {destination}");
            }
            Ok(())
        }
        Ok(None) => bail!("the URL carries no OAuth redirect parameters"),
        Err(err) => Err(user_facing(err)),
    }
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let runtime = runtime(config)?;
    let outcome = runtime.controller.on_load().await;

    if let Some(verification) = outcome.verification {
        if let Err(err) = verification.await {
            warn!(error = %err, "session verification task failed");
        }
    }

    println!("State: {}", runtime.controller.state().await);
    match runtime.controller.session().await {
        Some(session) => print_session(&session),
        None => println!("Not logged in."),
    }
    if let Some(err) = runtime.controller.last_error().await {
        println!("Last error: {}", err.user_message());
    }
    Ok(())
}

async fn logout(config: &Config) -> anyhow::Result<()> {
    let runtime = runtime(config)?;
    runtime.controller.restore().await;
    runtime.controller.logout().await.map_err(user_facing)?;
    println!("Logged out.");
    Ok(())
}

fn logs(config: &Config, json: bool) -> anyhow::Result<()> {
    let runtime = runtime(config)?;
    let entries = runtime.controller.auth_log().entries();
    if entries.is_empty() {
        println!("No auth events recorded.");
        return Ok(());
    }

    for entry in entries {
        if json {
            println!("{}", serde_json::to_string(&entry)?);
            continue;
        }
        match &entry.data {
            Some(data) => println!("{}  {}  {data}", entry.timestamp.to_rfc3339(), entry.message),
            None => println!("{}  {}", entry.timestamp.to_rfc3339(), entry.message),
        }
    }
    Ok(())
}

async fn relay_server(config: &Config, bind: Option<SocketAddr>) -> anyhow::Result<()> {
    let addr = match bind {
        Some(addr) => addr,
        None => config
            .relay
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid relay.bind address '{}'", config.relay.bind))?,
    };
    let state = RelayState::from_config(config)?;

    info!(%addr, token_url = %config.oauth.token_url, "starting token relay");
    println!("Token relay listening on http://{addr}/kick-auth");
    relay::serve(addr, state).await?;
    Ok(())
}

fn print_session(session: &Session) {
    println!("Logged in as {} (id {})", session.username, session.id);
    if let Some(email) = &session.email {
        println!("  email:    {email}");
    }
    if let Some(verified) = session.verified {
        println!("  verified: {verified}");
    }
    if let Some(avatar) = &session.avatar_url {
        println!("  avatar:   {avatar}");
    }
    println!("  refresh:  {}", if session.has_refresh_token() { "available" } else { "none" });
}

fn user_facing(err: AuthError) -> anyhow::Error {
    anyhow!("{} ({err})", err.user_message())
}
