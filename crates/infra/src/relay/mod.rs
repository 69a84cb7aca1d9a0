//! Server-side token relay, so the client secret never ships to clients.

pub mod server;

pub use server::{relay_router, serve, RelayError, RelayRequest, RelayState};
