use chrono::Utc;
use error_stack::{Result, ResultExt};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;
use crate::types::id::{marker::UserMarker, Id};

const ISSUER: &str = "huddle.api.auth";

/// Access tokens authenticate requests; refresh tokens may only be
/// traded in for a new access token. The claim keeps one from
/// standing in for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Jwt {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub kind: TokenKind,
    pub user_id: Id<UserMarker>,
}

/// Why a presented token was rejected. Expiry gets its own variant
/// so clients know to refresh instead of re-authenticating.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeTokenError {
    #[error("token is expired")]
    Expired,
    #[error("token kind is not allowed here")]
    WrongKind,
    #[error("token is malformed or carries an invalid signature")]
    Invalid,
}

#[derive(Debug, Error)]
#[error("Failed to encode JWT")]
pub struct EncodeJwtError;

impl Jwt {
    fn new(user_id: Id<UserMarker>, kind: TokenKind, ttl_secs: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
            iss: ISSUER.to_string(),
            kind,
            user_id,
        }
    }

    #[must_use]
    pub fn new_access(user_id: Id<UserMarker>, auth: &config::Auth) -> Self {
        Self::new(user_id, TokenKind::Access, auth.access_token_ttl_secs.get())
    }

    #[must_use]
    pub fn new_refresh(user_id: Id<UserMarker>, auth: &config::Auth) -> Self {
        Self::new(
            user_id,
            TokenKind::Refresh,
            auth.refresh_token_ttl_secs.get(),
        )
    }

    #[tracing::instrument(skip_all)]
    pub fn encode(&self, auth: &config::Auth) -> Result<String, EncodeJwtError> {
        let header = Header::new(Algorithm::HS512);
        let key = EncodingKey::from_secret(auth.jwt_secret.as_str().as_bytes());
        jsonwebtoken::encode(&header, self, &key).change_context(EncodeJwtError)
    }

    /// Decodes and verifies a token, then checks it is of the
    /// expected kind. Soft-deleted users are the caller's problem;
    /// this only proves the token itself.
    #[tracing::instrument(skip_all)]
    pub fn decode(
        token: &str,
        kind: TokenKind,
        auth: &config::Auth,
    ) -> std::result::Result<Self, DecodeTokenError> {
        let key = DecodingKey::from_secret(auth.jwt_secret.as_str().as_bytes());
        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 30;
        validation.validate_exp = true;
        validation.set_issuer(&[ISSUER]);

        let claims = match jsonwebtoken::decode::<Self>(token.trim(), &key, &validation) {
            Ok(data) => data.claims,
            Err(error) => {
                return Err(match error.kind() {
                    ErrorKind::ExpiredSignature => DecodeTokenError::Expired,
                    _ => DecodeTokenError::Invalid,
                })
            }
        };

        if claims.kind != kind {
            return Err(DecodeTokenError::WrongKind);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> config::Auth {
        config::Auth::for_tests()
    }

    #[test]
    fn test_round_trip() {
        let auth = auth();
        let user_id = Id::generate();

        let token = Jwt::new_access(user_id, &auth).encode(&auth).unwrap();
        let claims = Jwt::decode(&token, TokenKind::Access, &auth).unwrap();
        assert_eq!(user_id, claims.user_id);
        assert_eq!(TokenKind::Access, claims.kind);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let auth = auth();
        let token = Jwt::new_refresh(Id::generate(), &auth).encode(&auth).unwrap();

        assert_eq!(
            Err(DecodeTokenError::WrongKind),
            Jwt::decode(&token, TokenKind::Access, &auth)
        );
        assert!(Jwt::decode(&token, TokenKind::Refresh, &auth).is_ok());
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        let auth = auth();
        let now = Utc::now().timestamp();
        let stale = Jwt {
            iat: now - 7200,
            exp: now - 3600,
            iss: ISSUER.to_string(),
            kind: TokenKind::Access,
            user_id: Id::generate(),
        };

        let token = stale.encode(&auth).unwrap();
        assert_eq!(
            Err(DecodeTokenError::Expired),
            Jwt::decode(&token, TokenKind::Access, &auth)
        );
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let auth = auth();
        let token = Jwt::new_access(Id::generate(), &auth).encode(&auth).unwrap();
        let mut tampered = token.clone();
        tampered.truncate(token.len() - 2);

        assert_eq!(
            Err(DecodeTokenError::Invalid),
            Jwt::decode(&tampered, TokenKind::Access, &auth)
        );
    }
}
