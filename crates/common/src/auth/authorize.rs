//! Authorization request URLs and redirect parsing
//!
//! The outbound side builds the provider authorize URL for a pending login.
//! The inbound side reads the OAuth parameters off the redirect location
//! and strips them again so a processed redirect is never replayed.

use url::Url;

use super::pkce::{derive_code_challenge, CHALLENGE_METHOD};
use super::types::OAuthConfig;

/// Query parameters consumed from a redirect location.
pub const REDIRECT_PARAMS: [&str; 4] = ["code", "state", "error", "error_description"];

/// Base used to resolve relative locations such as `/login?code=...`.
const RELATIVE_BASE: &str = "http://localhost";

/// Build the provider authorize URL for the given verifier and state.
#[must_use]
pub fn build_authorization_url(config: &OAuthConfig, code_verifier: &str, state: &str) -> String {
    let code_challenge = derive_code_challenge(code_verifier);
    let scope = config.scope_string();

    let params = [
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", scope.as_str()),
        ("code_challenge", code_challenge.as_str()),
        ("code_challenge_method", CHALLENGE_METHOD),
        ("state", state),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url, query_string)
}

/// PKCE-relevant parameters of a built authorize URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationParams {
    pub state: String,
    pub code_challenge: String,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
}

/// Parse an authorize URL back into its `state` and `code_challenge`.
/// Returns `None` when either is missing or the URL is malformed.
#[must_use]
pub fn parse_authorization_url(url: &str) -> Option<AuthorizationParams> {
    let parsed = Url::parse(url).ok()?;
    let mut state = None;
    let mut code_challenge = None;
    let mut redirect_uri = None;
    let mut scope = None;

    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "state" => state = Some(value.into_owned()),
            "code_challenge" => code_challenge = Some(value.into_owned()),
            "redirect_uri" => redirect_uri = Some(value.into_owned()),
            "scope" => scope = Some(value.into_owned()),
            _ => {}
        }
    }

    Some(AuthorizationParams { state: state?, code_challenge: code_challenge?, redirect_uri, scope })
}

/// OAuth parameters found on a redirect location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectParams {
    /// Read the redirect parameters from an absolute or relative location.
    /// Empty values count as absent.
    #[must_use]
    pub fn from_location(location: &str) -> Self {
        let Some((url, _)) = parse_location(location) else {
            return Self::default();
        };

        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// `true` when the location carries anything the controller must act on.
    #[must_use]
    pub fn is_oauth_return(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}

/// Return `location` with every OAuth redirect parameter removed. Other
/// query parameters and the fragment are preserved. Idempotent.
#[must_use]
pub fn strip_redirect_params(location: &str) -> String {
    let Some((mut url, relative)) = parse_location(location) else {
        return location.to_string();
    };

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !REDIRECT_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if retained.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(retained);
    }

    if relative {
        let mut out = url.path().to_string();
        if let Some(query) = url.query() {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            out.push('#');
            out.push_str(fragment);
        }
        out
    } else {
        url.to_string()
    }
}

fn parse_location(location: &str) -> Option<(Url, bool)> {
    match Url::parse(location) {
        Ok(url) => Some((url, false)),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_BASE).ok()?;
            base.join(location).ok().map(|url| (url, true))
        }
        Err(_) => None,
    }
}
