//! HTTP client with bounded retries used by the token and profile clients.

mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpError};
