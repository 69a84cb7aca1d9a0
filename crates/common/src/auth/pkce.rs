//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 with the S256 method. The verifier is hex-encoded
//! (64 characters, inside the 43-128 limit); the challenge and the state
//! nonce are base64url without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Number of random bytes behind verifiers and state nonces.
const ENTROPY_BYTES: usize = 32;

/// PKCE challenge method sent to the authorize endpoint.
pub const CHALLENGE_METHOD: &str = "S256";

#[derive(Debug, Error)]
pub enum PkceError {
    #[error("secure random source unavailable: {0}")]
    RandomSource(String),
}

fn random_bytes() -> Result<[u8; ENTROPY_BYTES], PkceError> {
    let mut bytes = [0u8; ENTROPY_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| PkceError::RandomSource(e.to_string()))?;
    Ok(bytes)
}

/// Generate a cryptographically secure code verifier
///
/// 32 bytes from the OS CSPRNG, lowercase hex encoded (64 characters).
///
/// # Errors
/// Returns [`PkceError::RandomSource`] if the OS random source fails.
pub fn generate_code_verifier() -> Result<String, PkceError> {
    Ok(hex::encode(random_bytes()?))
}

/// Derive the S256 code challenge: BASE64URL(SHA256(ASCII(code_verifier)))
#[must_use]
pub fn derive_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random state token for CSRF protection (43 characters).
///
/// # Errors
/// Returns [`PkceError::RandomSource`] if the OS random source fails.
pub fn generate_state() -> Result<String, PkceError> {
    Ok(URL_SAFE_NO_PAD.encode(random_bytes()?))
}

/// Compare the persisted state with the one returned on the redirect in
/// constant time.
#[must_use]
pub fn validate_state(expected: &str, actual: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(actual.as_bytes()).into()
}

/// Verifier, challenge and state for one login attempt.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Kept secret until token exchange
    pub code_verifier: String,

    /// Sent in the authorization request
    pub code_challenge: String,

    /// Must match between authorization request and redirect
    pub state: String,
}

impl PkceChallenge {
    /// Generate a fresh verifier, its challenge and a state nonce.
    ///
    /// # Examples
    /// ```
    /// use kickstream_common::auth::pkce::PkceChallenge;
    ///
    /// let challenge = PkceChallenge::generate().unwrap();
    /// assert_eq!(challenge.code_verifier.len(), 64);
    /// assert_eq!(challenge.code_challenge.len(), 43);
    /// ```
    pub fn generate() -> Result<Self, PkceError> {
        let code_verifier = generate_code_verifier()?;
        let code_challenge = derive_code_challenge(&code_verifier);
        let state = generate_state()?;

        Ok(Self { code_verifier, code_challenge, state })
    }

    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        CHALLENGE_METHOD
    }
}
