use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims embedded in both bearer token kinds.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — user id
    pub sub: i32,
    /// Expiry (unix timestamp)
    pub exp: i64,
    /// Issued at (unix timestamp)
    pub iat: i64,
}

/// The two independently-keyed bearer tokens the service mints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived, carried in the Authorization header
    Access,
    /// Day-scale, carried in the httpOnly rotation cookie
    Rotation,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed or its signature is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("token was signed with an unexpected algorithm")]
    WrongAlgorithm,
}

/// Mints and verifies the two signed bearer tokens. Keys are loaded once
/// at startup; lifetimes are hard and checked on every verify.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    rotation_encoding: EncodingKey,
    rotation_decoding: DecodingKey,
    access_ttl: Duration,
    rotation_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(
        access_key: &str,
        rotation_key: &str,
        access_ttl_minutes: i64,
        rotation_ttl_hours: i64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_key.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_key.as_bytes()),
            rotation_encoding: EncodingKey::from_secret(rotation_key.as_bytes()),
            rotation_decoding: DecodingKey::from_secret(rotation_key.as_bytes()),
            access_ttl: Duration::minutes(access_ttl_minutes),
            rotation_ttl: Duration::hours(rotation_ttl_hours),
        }
    }

    #[must_use]
    pub const fn rotation_ttl(&self) -> Duration {
        self.rotation_ttl
    }

    pub fn mint(&self, kind: TokenKind, user_id: i32) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Rotation => self.rotation_ttl,
        };
        let claims = Claims {
            sub: user_id,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        let key = match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Rotation => &self.rotation_encoding,
        };

        encode(&Header::new(Algorithm::HS256), &claims, key).map_err(|_| TokenError::Invalid)
    }

    /// Verify a token of the given kind and return the embedded user id.
    /// Failures are distinct: malformed/bad signature, expired, and
    /// wrong-algorithm each map to their own variant.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<i32, TokenError> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Rotation => &self.rotation_decoding,
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::WrongAlgorithm
            }
            _ => TokenError::Invalid,
        })?;

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("access-test-key", "rotation-test-key", 15, 24)
    }

    #[test]
    fn mint_then_verify_returns_user_id() {
        let svc = service();
        let token = svc.mint(TokenKind::Access, 42).unwrap();
        assert_eq!(svc.verify(TokenKind::Access, &token), Ok(42));
    }

    #[test]
    fn keys_are_independent_per_kind() {
        let svc = service();
        let token = svc.mint(TokenKind::Rotation, 7).unwrap();
        assert_eq!(
            svc.verify(TokenKind::Access, &token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn expired_token_is_reported_distinctly() {
        let svc = TokenService::new("access-test-key", "rotation-test-key", -1, 24);
        let token = svc.mint(TokenKind::Access, 1).unwrap();
        assert_eq!(
            svc.verify(TokenKind::Access, &token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn garbage_is_invalid() {
        let svc = service();
        assert_eq!(
            svc.verify(TokenKind::Access, "not-a-token"),
            Err(TokenError::Invalid)
        );
    }
}
