//! HMAC-signed JWT issuing and verification.

use edgeway_kernel::{AuthConfig, AuthFailure, JwtAlgorithm, TokenVerifier};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Claims carried by gateway tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Authenticated subject.
    #[serde(default)]
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

fn algorithm(alg: JwtAlgorithm) -> Algorithm {
    match alg {
        JwtAlgorithm::HS256 => Algorithm::HS256,
        JwtAlgorithm::HS384 => Algorithm::HS384,
        JwtAlgorithm::HS512 => Algorithm::HS512,
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthFailure {
    match err.kind() {
        ErrorKind::Crypto(_) => AuthFailure::Undeterminable(err.to_string()),
        _ => AuthFailure::Invalid(err.to_string()),
    }
}

/// Shared-secret JWT verifier; also issues tokens for the same secret.
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    expiration: Duration,
}

impl JwtVerifier {
    pub fn new(secret: &str, alg: JwtAlgorithm, expiration: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: algorithm(alg),
            expiration,
        }
    }

    /// `None` when no secret is configured.
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        config
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|secret| {
                Self::new(
                    secret,
                    config.algorithm,
                    Duration::from_millis(config.expiration_ms),
                )
            })
    }

    /// Sign a token for `subject`, valid for the configured expiration.
    pub fn issue(&self, subject: &str) -> Result<String, AuthFailure> {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.expiration.as_secs(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AuthFailure::Undeterminable(e.to_string()))
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<String, AuthFailure> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp"]);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(classify)?;
        let subject = data.claims.sub;
        if subject.trim().is_empty() {
            return Err(AuthFailure::Invalid("token carries no subject".to_string()));
        }
        Ok(subject)
    }
}

/// Verifier used when no signing secret is configured: every presented
/// token is rejected as unverifiable.
#[derive(Debug, Default)]
pub struct UnconfiguredVerifier;

impl TokenVerifier for UnconfiguredVerifier {
    fn verify(&self, _token: &str) -> Result<String, AuthFailure> {
        Err(AuthFailure::Undeterminable(
            "no jwt secret configured".to_string(),
        ))
    }
}
