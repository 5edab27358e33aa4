//! Bearer token verification
//!
//! [`TokenVerifier`] is the seam the identity resolver depends on. The
//! shipped implementation, [`JwtService`], verifies HS256 JWTs with an issuer
//! check and can mint development tokens for the `user token` command.

use crate::error::AuthError;
use crate::identity::types::{Claims, UserRecord};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// Verifies a bearer token and returns its claims
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// JWT service - creates and verifies HS256 tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    /// Create a new JWT service with secret and issuer
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    /// Issue a token for a user that expires after `ttl`
    pub fn issue(
        &self,
        user: &UserRecord,
        ttl: chrono::Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }
}

impl TokenVerifier for JwtService {
    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))
    }
}
