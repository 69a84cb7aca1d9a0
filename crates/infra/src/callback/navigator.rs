//! [`Navigator`] for processes without an address bar.

use std::sync::Arc;

use kickstream_common::auth::Navigator;
use parking_lot::Mutex;
use tracing::{debug, info};

/// Tracks the "current location" of a terminal session.
///
/// The location starts at the landing route and becomes the redirect URL
/// once one is received. Navigations are recorded so the caller can report
/// where the user should go next.
#[derive(Debug, Clone, Default)]
pub struct TerminalNavigator {
    current: Arc<Mutex<String>>,
    navigations: Arc<Mutex<Vec<String>>>,
}

impl TerminalNavigator {
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        let navigator = Self::default();
        navigator.set_location(location);
        navigator
    }

    /// Land on `location`, e.g. a received redirect URL.
    pub fn set_location(&self, location: impl Into<String>) {
        *self.current.lock() = location.into();
    }

    #[must_use]
    pub fn last_navigation(&self) -> Option<String> {
        self.navigations.lock().last().cloned()
    }
}

impl Navigator for TerminalNavigator {
    fn current_url(&self) -> String {
        self.current.lock().clone()
    }

    fn replace_url(&self, url: &str) {
        debug!("location rewritten without redirect parameters");
        *self.current.lock() = url.to_string();
    }

    fn navigate(&self, destination: &str) {
        if destination.starts_with("http://") || destination.starts_with("https://") {
            info!("navigation to external authorize page requested");
        } else {
            info!(%destination, "navigating");
        }
        self.navigations.lock().push(destination.to_string());
    }
}
