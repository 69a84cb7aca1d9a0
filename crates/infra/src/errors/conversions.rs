//! Conversions from component and external errors into domain errors.

use kickstream_common::auth::StoreError;
use kickstream_common::HttpError;
use kickstream_domain::KickStreamError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub KickStreamError);

impl From<InfraError> for KickStreamError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl std::fmt::Display for InfraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for InfraError {}

trait IntoKickStreamError {
    fn into_kickstream(self) -> KickStreamError;
}

/* -------------------------------------------------------------------------- */
/* StoreError / std::io::Error → KickStreamError */
/* -------------------------------------------------------------------------- */

impl IntoKickStreamError for StoreError {
    fn into_kickstream(self) -> KickStreamError {
        match self {
            StoreError::Io(msg) => KickStreamError::Storage(msg),
            StoreError::Serialization(msg) => {
                KickStreamError::Storage(format!("corrupt store document: {msg}"))
            }
            StoreError::InvalidSession(msg) => KickStreamError::InvalidInput(msg),
        }
    }
}

impl From<StoreError> for InfraError {
    fn from(value: StoreError) -> Self {
        InfraError(value.into_kickstream())
    }
}

/// Socket errors from binding the redirect listener or the relay.
impl IntoKickStreamError for std::io::Error {
    fn into_kickstream(self) -> KickStreamError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::AddrInUse | ErrorKind::AddrNotAvailable | ErrorKind::PermissionDenied => {
                KickStreamError::Network(format!("cannot bind address: {self}"))
            }
            _ => KickStreamError::Network(self.to_string()),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_kickstream())
    }
}

/* -------------------------------------------------------------------------- */
/* HttpError → KickStreamError */
/* -------------------------------------------------------------------------- */

impl IntoKickStreamError for HttpError {
    fn into_kickstream(self) -> KickStreamError {
        match self {
            HttpError::Build(msg) => KickStreamError::Config(format!("HTTP client: {msg}")),
            HttpError::NotCloneable => KickStreamError::Internal(self.to_string()),
            HttpError::Timeout(_) => KickStreamError::Network("HTTP request timed out".into()),
            HttpError::Transport(msg) => KickStreamError::Network(msg),
        }
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_kickstream())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
