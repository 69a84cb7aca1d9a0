//! # KickStream Domain
//!
//! Domain-level types shared by the KickStream Helper crates.
//!
//! This crate contains:
//! - Application error type and Result definition
//! - Configuration structures
//! - Domain constants (storage keys, routes, provider endpoints)
//!
//! ## Architecture
//! - No dependencies on other KickStream crates
//! - Only external dependencies allowed

pub mod macros;

pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
