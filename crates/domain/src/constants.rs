//! Application constants
//!
//! Centralized location for domain-level constants: persisted storage keys,
//! in-app routes and the Kick provider defaults.

// Persisted storage keys
pub const STORAGE_KEY_USER: &str = "kickstream_user";
pub const STORAGE_KEY_OAUTH_STATE: &str = "kickstream_oauth_state";
pub const STORAGE_KEY_CODE_VERIFIER: &str = "kickstream_code_verifier";
pub const STORAGE_KEY_RETURN_TO: &str = "kickstream_return_to";
pub const STORAGE_KEY_AUTH_LOGS: &str = "kickstream_auth_logs";

/// Maximum number of retained auth log entries (oldest evicted first).
pub const AUTH_LOG_CAPACITY: usize = 20;

// Routes
pub const LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_LANDING_ROUTE: &str = "/dashboard";

// Kick provider defaults
pub const KICK_CLIENT_ID: &str = "01JQMD5PMFX0MFYPMT9A7YDHGC";
pub const KICK_AUTHORIZE_URL: &str = "https://id.kick.com/oauth/authorize";
pub const KICK_TOKEN_URL: &str = "https://id.kick.com/oauth/token";
pub const KICK_SCOPES: &[&str] =
    &["user:read", "channel:read", "events:read", "events:subscribe", "chat:read"];
pub const KICK_PROFILE_ENDPOINTS: &[&str] =
    &["https://kick.com/api/v2/user/me", "https://kick.com/api/v1/user", "https://kick.com/api/user"];
pub const KICK_DEFAULT_AVATAR_URL: &str = "https://static.kick.com/images/user/default-profile.png";

// Local defaults
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/login";
pub const DEFAULT_RELAY_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_STORE_FILE: &str = "kickstream-store.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HTTP_MAX_ATTEMPTS: usize = 2;
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;
