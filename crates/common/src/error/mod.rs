//! Error classification shared by the KickStream component errors
//!
//! Every module owns its error enum (`PkceError`, `HttpError`,
//! `TokenExchangeError`, `ProfileError`, `StoreError`, `AuthError`). This
//! module supplies the cross-cutting vocabulary those enums implement so the
//! controller, the logging layer and the CLI can make decisions without
//! matching on concrete variants:
//!
//! ```rust,ignore
//! impl ErrorClassification for TokenExchangeError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Transport(_))
//!     }
//!     // ... implement other trait methods
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// How an error should be treated by whoever receives it.
pub trait ErrorClassification {
    /// Transient failure (timeout, refused connection, provider 5xx) that a
    /// later attempt may not hit.
    fn is_retryable(&self) -> bool;

    fn severity(&self) -> ErrorSeverity;

    /// A possible forged redirect or a corrupted local store.
    fn is_critical(&self) -> bool;

    fn retry_after(&self) -> Option<Duration>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Expected outcome such as a cancelled login.
    Info,
    /// Recoverable; the session is kept.
    Warning,
    /// The flow failed and local auth state was cleared.
    Error,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(label)
    }
}
