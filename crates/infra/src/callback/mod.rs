//! Redirect landing for the terminal flow
//!
//! The provider redirects the browser to the registered redirect URI. The
//! [`CallbackListener`] serves that URI on loopback and hands the full
//! redirect URL to the caller, which feeds it to the controller through a
//! [`TerminalNavigator`].

pub mod navigator;
pub mod server;

pub use navigator::TerminalNavigator;
pub use server::CallbackListener;
