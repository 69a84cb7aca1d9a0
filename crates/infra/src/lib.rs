//! # KickStream Infrastructure
//!
//! Implementations of the ports defined in `kickstream-common::auth`, plus
//! the processes that surround the login flow.
//!
//! This crate contains:
//! - Configuration loading (files + `KICKSTREAM_*` environment overrides)
//! - The JSON file key-value store
//! - The loopback redirect listener and terminal navigator
//! - The token relay server
//! - Wiring of the auth session controller from a [`Config`]
//!
//! ## Architecture
//! - Implements traits defined in `kickstream-common`
//! - Depends on `kickstream-domain` for configuration and errors
//! - Contains all "impure" code (files, sockets, environment)
//!
//! [`Config`]: kickstream_domain::Config

pub mod bootstrap;
pub mod callback;
pub mod config;
pub mod errors;
pub mod relay;
pub mod storage;

// Re-export commonly used items
pub use bootstrap::{build_controller, AuthRuntime};
pub use callback::{CallbackListener, TerminalNavigator};
pub use errors::InfraError;
pub use relay::{relay_router, RelayState};
pub use storage::FileStore;
