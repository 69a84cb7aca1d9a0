//! Configuration loading
//!
//! Reads the helper configuration from files and `KICKSTREAM_*`
//! environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths};
