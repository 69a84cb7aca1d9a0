//! Tracing subscriber setup for the binary.
//!
//! `RUST_LOG` wins when set; otherwise `kickstream=info` (or `debug` with
//! `--verbose`). `KICKSTREAM_LOG_JSON=1` switches to JSON lines. Logs go to
//! stderr so command output on stdout stays clean.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const JSON_ENV: &str = "KICKSTREAM_LOG_JSON";

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "kickstream=debug,kickstream_common=debug,kickstream_infra=debug"
    } else {
        "kickstream=info,kickstream_common=info,kickstream_infra=info"
    }
}

fn json_requested() -> bool {
    std::env::var(JSON_ENV)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

pub fn init(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    if json_requested() {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .context("failed to initialize logging")?;
    } else {
        registry
            .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
            .try_init()
            .context("failed to initialize logging")?;
    }
    Ok(())
}
