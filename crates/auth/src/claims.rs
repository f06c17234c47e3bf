use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::AuthError;

/// Session token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Unique per mint, so two logins in the same second get distinct tokens.
    pub jti: String,
}

/// A freshly minted session token and its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Why a presented token was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not a structurally valid JWT (bad segments, base64 or JSON).
    #[error("malformed token")]
    Malformed,

    /// Well-formed, but the signature, algorithm or expiry check failed.
    #[error("invalid token")]
    Invalid,
}

/// Mints and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl core::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn mint(&self, username: &str, issued_at: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let ttl = TimeDelta::from_std(self.ttl).map_err(|_| AuthError::TtlOutOfRange)?;
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(AuthError::TtlOutOfRange)?;

        let claims = Claims {
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::now_v7().simple().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                    TokenError::Malformed
                }
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(secret.as_bytes(), Duration::from_secs(600))
    }

    #[test]
    fn mint_and_verify_roundtrip() {
        let issuer = test_issuer("secret-A");
        let now = Utc::now();

        let issued = issuer.mint("johnny", now).unwrap();
        let claims = issuer.verify(&issued.token).unwrap();

        assert_eq!(claims.username, "johnny");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, claims.iat + 600);
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
    }

    #[test]
    fn same_instant_mints_distinct_tokens() {
        let issuer = test_issuer("secret-A");
        let now = Utc::now();

        let a = issuer.mint("johnny", now).unwrap();
        let b = issuer.mint("johnny", now).unwrap();

        assert_ne!(a.token, b.token);
        assert_ne!(issuer.verify(&a.token).unwrap().jti, issuer.verify(&b.token).unwrap().jti);
    }

    #[test]
    fn expired_token_is_invalid() {
        let issuer = test_issuer("secret-A");
        let issued = issuer.mint("johnny", Utc::now() - TimeDelta::minutes(20)).unwrap();

        assert_eq!(issuer.verify(&issued.token), Err(TokenError::Invalid));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let issued = test_issuer("secret-A").mint("johnny", Utc::now()).unwrap();

        assert_eq!(test_issuer("secret-B").verify(&issued.token), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_malformed() {
        let issuer = test_issuer("secret-A");
        assert_eq!(issuer.verify("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(issuer.verify("a.b.c"), Err(TokenError::Malformed));
    }
}
