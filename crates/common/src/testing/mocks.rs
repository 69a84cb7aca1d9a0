//! Mock implementations of the auth controller ports
//!
//! Each mock records its calls so tests can assert on what the controller
//! did (or, as often, did not do).

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{
    Navigator, ProfileError, ProfileFetcher, TokenExchangeError, TokenExchanger, TokenSet,
    UserProfile,
};

type Scripted<T, E> = Arc<Mutex<VecDeque<Result<T, E>>>>;

/// Mock token endpoint
///
/// Scripted results are consumed in order; once exhausted, the fallback
/// result is returned.
#[derive(Debug, Clone)]
pub struct MockTokenExchanger {
    exchange_results: Scripted<TokenSet, TokenExchangeError>,
    refresh_results: Scripted<TokenSet, TokenExchangeError>,
    exchange_calls: Arc<Mutex<Vec<(String, String)>>>,
    refresh_calls: Arc<Mutex<Vec<String>>>,
}

impl MockTokenExchanger {
    pub fn new() -> Self {
        Self {
            exchange_results: Arc::default(),
            refresh_results: Arc::default(),
            exchange_calls: Arc::default(),
            refresh_calls: Arc::default(),
        }
    }

    /// Exchanger whose code exchange always yields `tokens`.
    pub fn returning(tokens: TokenSet) -> Self {
        let mock = Self::new();
        mock.push_exchange(Ok(tokens));
        mock
    }

    pub fn push_exchange(&self, result: Result<TokenSet, TokenExchangeError>) {
        self.exchange_results.lock().push_back(result);
    }

    pub fn push_refresh(&self, result: Result<TokenSet, TokenExchangeError>) {
        self.refresh_results.lock().push_back(result);
    }

    /// `(code, code_verifier)` pairs received so far.
    pub fn exchange_calls(&self) -> Vec<(String, String)> {
        self.exchange_calls.lock().clone()
    }

    pub fn exchange_count(&self) -> usize {
        self.exchange_calls.lock().len()
    }

    pub fn refresh_calls(&self) -> Vec<String> {
        self.refresh_calls.lock().clone()
    }

    fn next(
        queue: &Scripted<TokenSet, TokenExchangeError>,
    ) -> Result<TokenSet, TokenExchangeError> {
        let mut queue = queue.lock();
        if queue.len() > 1 {
            return queue.pop_front().unwrap_or(Err(TokenExchangeError::MissingAccessToken));
        }
        queue.front().cloned().unwrap_or(Err(TokenExchangeError::Status {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        }))
    }
}

impl Default for MockTokenExchanger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenExchanger for MockTokenExchanger {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, TokenExchangeError> {
        self.exchange_calls.lock().push((code.to_string(), code_verifier.to_string()));
        Self::next(&self.exchange_results)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, TokenExchangeError> {
        self.refresh_calls.lock().push(refresh_token.to_string());
        Self::next(&self.refresh_results)
    }
}

/// Mock user-info API
#[derive(Debug, Clone)]
pub struct MockProfileFetcher {
    results: Scripted<UserProfile, ProfileError>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
    slow_token: Option<(String, Duration)>,
}

impl MockProfileFetcher {
    pub fn new() -> Self {
        Self { results: Arc::default(), calls: Arc::default(), delay: None, slow_token: None }
    }

    pub fn returning(profile: UserProfile) -> Self {
        let mock = Self::new();
        mock.push(Ok(profile));
        mock
    }

    pub fn failing(err: ProfileError) -> Self {
        let mock = Self::new();
        mock.push(Err(err));
        mock
    }

    /// Sleep before answering, to keep a call in flight.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep only when called with `access_token`.
    #[must_use]
    pub fn with_delay_on(mut self, access_token: &str, delay: Duration) -> Self {
        self.slow_token = Some((access_token.to_string(), delay));
        self
    }

    pub fn push(&self, result: Result<UserProfile, ProfileError>) {
        self.results.lock().push_back(result);
    }

    /// Access tokens the mock was called with.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for MockProfileFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileFetcher for MockProfileFetcher {
    async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, ProfileError> {
        self.calls.lock().push(access_token.to_string());
        let delay = match &self.slow_token {
            Some((token, delay)) if token == access_token => Some(*delay),
            _ => self.delay,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut queue = self.results.lock();
        if queue.len() > 1 {
            return queue
                .pop_front()
                .unwrap_or_else(|| Err(ProfileError::Unavailable("mock exhausted".into())));
        }
        queue
            .front()
            .cloned()
            .unwrap_or_else(|| Err(ProfileError::Unavailable("no mock profile configured".into())))
    }
}

/// Mock location bar
#[derive(Debug, Clone, Default)]
pub struct MockNavigator {
    current: Arc<Mutex<String>>,
    replaced: Arc<Mutex<Vec<String>>>,
    navigations: Arc<Mutex<Vec<String>>>,
}

impl MockNavigator {
    pub fn at(location: &str) -> Self {
        let nav = Self::default();
        nav.set_location(location);
        nav
    }

    /// Simulate the browser landing on `location`.
    pub fn set_location(&self, location: &str) {
        *self.current.lock() = location.to_string();
    }

    pub fn replaced(&self) -> Vec<String> {
        self.replaced.lock().clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }

    pub fn last_navigation(&self) -> Option<String> {
        self.navigations.lock().last().cloned()
    }
}

impl Navigator for MockNavigator {
    fn current_url(&self) -> String {
        self.current.lock().clone()
    }

    fn replace_url(&self, url: &str) {
        self.replaced.lock().push(url.to_string());
        *self.current.lock() = url.to_string();
    }

    fn navigate(&self, destination: &str) {
        self.navigations.lock().push(destination.to_string());
    }
}
