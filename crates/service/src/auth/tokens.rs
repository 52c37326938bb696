use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use serde::{Deserialize, Serialize};

use super::errors::AuthError;

/// What a JWT may be used for. Stored in the `scope` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Access,
    Verification,
    PasswordReset,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Access => "access_token",
            TokenScope::Verification => "verification_token",
            TokenScope::PasswordReset => "password_reset",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer/verifier.
#[derive(Clone)]
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, subject: &str, scope: TokenScope, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            scope: scope.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&JwtHeader::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Verify signature, expiry and scope. All failures map to `InvalidToken`.
    pub fn verify(&self, token: &str, scope: TokenScope) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::InvalidToken("Could not validate credentials".into()))?;
        if data.claims.scope != scope.as_str() {
            return Err(AuthError::InvalidToken("Invalid token scope".into()));
        }
        Ok(data.claims)
    }
}
