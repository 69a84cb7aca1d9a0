//! Persistent key-value storage for the auth session keys.

pub mod file_store;

pub use file_store::FileStore;
