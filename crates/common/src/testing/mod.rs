//! Testing utilities for the auth controller
//!
//! - **[`mocks`]**: in-memory implementations of the controller ports with
//!   call recording
//! - **[`fixtures`]**: ready-made sessions, profiles and token sets
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kickstream_common::testing::{fixtures, MockProfileFetcher};
//!
//! let profiles = MockProfileFetcher::returning(fixtures::profile("streamer"));
//! assert_eq!(profiles.call_count(), 0);
//! ```

pub mod fixtures;
pub mod mocks;

pub use mocks::{MockNavigator, MockProfileFetcher, MockTokenExchanger};
