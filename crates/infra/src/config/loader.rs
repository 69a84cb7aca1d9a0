//! Configuration loader
//!
//! Loads the helper configuration from a file (if any), then applies
//! environment overrides and validates the result.
//!
//! ## Loading Strategy
//! 1. Use the explicit path when one is given, otherwise probe the standard
//!    locations; no file at all means built-in defaults
//! 2. Parse by extension (JSON or TOML)
//! 3. Apply `KICKSTREAM_*` environment overrides
//! 4. Validate
//!
//! ## Environment Variables
//! - `KICKSTREAM_CLIENT_ID`: OAuth client id
//! - `KICKSTREAM_CLIENT_SECRET`: client secret (relay server or direct mode)
//! - `KICKSTREAM_REDIRECT_URI`: registered redirect URI
//! - `KICKSTREAM_TOKEN_MODE`: `direct` or `relay`
//! - `KICKSTREAM_RELAY_URL`: relay endpoint; implies relay mode when the mode
//!   is not set explicitly
//! - `KICKSTREAM_STORE_PATH`: JSON store file
//! - `KICKSTREAM_HTTP_TIMEOUT_SECS`: per-request timeout
//! - `KICKSTREAM_PLACEHOLDER_PROFILE`: allow the synthetic profile fallback
//! - `KICKSTREAM_RELAY_BIND`: relay server bind address
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./kickstream.toml` or `./kickstream.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use kickstream_domain::{Config, KickStreamError, Result, TokenEndpointMode};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["kickstream.toml", "kickstream.json", "config.toml", "config.json"];

/// Load configuration with the standard strategy.
///
/// # Errors
/// Returns `KickStreamError::Config` if:
/// - The explicit file does not exist
/// - File format is invalid
/// - An environment override cannot be parsed
/// - The merged configuration fails validation
pub fn load(path: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_from_file(&path)?,
        None => match probe_config_paths() {
            Some(found) => load_from_file(&found)?,
            None => {
                tracing::debug!("no config file found; using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from one file, without environment overrides.
///
/// # Errors
/// Returns `KickStreamError::Config` if the file is missing, unreadable, or
/// malformed.
pub fn load_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(KickStreamError::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| KickStreamError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Parse configuration from string content. Format is detected by file
/// extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| KickStreamError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| KickStreamError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(KickStreamError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the working directory, then the executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Apply `KICKSTREAM_*` overrides on top of `config`.
///
/// # Errors
/// Returns `KickStreamError::Config` when a numeric or enum variable has an
/// invalid value.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(client_id) = env_string("KICKSTREAM_CLIENT_ID") {
        config.oauth.client_id = client_id;
    }
    if let Some(secret) = env_string("KICKSTREAM_CLIENT_SECRET") {
        config.oauth.client_secret = Some(secret);
    }
    if let Some(redirect_uri) = env_string("KICKSTREAM_REDIRECT_URI") {
        config.oauth.redirect_uri = redirect_uri;
    }

    let relay_url = env_string("KICKSTREAM_RELAY_URL");
    match env_string("KICKSTREAM_TOKEN_MODE") {
        Some(mode) => {
            config.oauth.token_mode = mode.parse::<TokenEndpointMode>().map_err(|_| {
                KickStreamError::Config(format!("Invalid KICKSTREAM_TOKEN_MODE: {mode}"))
            })?;
        }
        None if relay_url.is_some() => config.oauth.token_mode = TokenEndpointMode::Relay,
        None => {}
    }
    if relay_url.is_some() {
        config.oauth.relay_url = relay_url;
    }

    if let Some(path) = env_string("KICKSTREAM_STORE_PATH") {
        config.storage.path = PathBuf::from(path);
    }
    if let Some(timeout) = env_string("KICKSTREAM_HTTP_TIMEOUT_SECS") {
        config.http.timeout_secs = timeout.parse::<u64>().map_err(|e| {
            KickStreamError::Config(format!("Invalid KICKSTREAM_HTTP_TIMEOUT_SECS: {e}"))
        })?;
    }
    if let Some(enabled) = env_bool("KICKSTREAM_PLACEHOLDER_PROFILE") {
        config.profile.placeholder_fallback = enabled;
    }
    if let Some(bind) = env_string("KICKSTREAM_RELAY_BIND") {
        config.relay.bind = bind;
    }

    Ok(())
}

/// Non-empty environment variable
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str) -> Option<bool> {
    env_string(key).map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
