//! Deterministic fixtures for auth tests

use crate::auth::{Session, TokenSet, UserProfile};

#[must_use]
pub fn profile(username: &str) -> UserProfile {
    UserProfile {
        id: format!("id-{username}"),
        username: username.to_string(),
        avatar_url: Some(format!("https://files.kick.com/images/{username}.png")),
        email: Some(format!("{username}@example.com")),
        verified: Some(true),
    }
}

#[must_use]
pub fn tokens(access_token: &str, refresh_token: Option<&str>) -> TokenSet {
    TokenSet::new(access_token.to_string(), refresh_token.map(str::to_string), Some(3600), None)
}

#[must_use]
pub fn session(username: &str, access_token: &str, refresh_token: Option<&str>) -> Session {
    Session::from_parts(profile(username), &tokens(access_token, refresh_token))
}
