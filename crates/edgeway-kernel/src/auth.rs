//! Bearer-token verification contract.

use thiserror::Error;

/// Why a presented credential was not accepted.
///
/// The pipeline rejects both variants with `401`; they are kept apart so
/// logs can tell a bad token from a verifier that could not decide.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthFailure {
    /// The credential is malformed, has a bad signature, is expired, or
    /// carries no subject.
    #[error("invalid credential: {0}")]
    Invalid(String),

    /// The verifier failed for a reason unrelated to the credential itself.
    #[error("credential could not be verified: {0}")]
    Undeterminable(String),
}

/// Verifies a bearer token and yields the authenticated subject.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<String, AuthFailure>;
}
