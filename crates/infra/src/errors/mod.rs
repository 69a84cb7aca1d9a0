//! Conversions from component errors into [`KickStreamError`].
//!
//! [`KickStreamError`]: kickstream_domain::KickStreamError

mod conversions;

pub use conversions::InfraError;
