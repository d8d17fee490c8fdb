use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::auth::claims::{Claims, TokenKind, TokenSubject};
use crate::config::JwtConfig;
use crate::telemetry::{observe_sync, op_span, Traced};

pub const ACCESS_TTL: Duration = Duration::hours(24);
pub const REFRESH_TTL: Duration = Duration::hours(24 * 7);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// A signed token and its expiry as a unix timestamp.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Signs bearer tokens for an authenticated identity.
pub trait TokenIssuer: Send + Sync {
    fn generate_access_token(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenError>;
    fn generate_refresh_token(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenError>;
}

/// HS256 signer over one process-wide secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    secret_is_empty: bool,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            secret_is_empty: secret.is_empty(),
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(&config.secret)
    }

    fn sign_with_kind(
        &self,
        subject: &TokenSubject,
        kind: TokenKind,
    ) -> Result<IssuedToken, TokenError> {
        if self.secret_is_empty {
            return Err(TokenError::EmptySecret);
        }
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => ACCESS_TTL,
            TokenKind::Refresh => REFRESH_TTL,
        };
        let claims = Claims {
            user_id: subject.user_id,
            full_name: subject.full_name.clone(),
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            kind,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %subject.user_id, kind = %kind, "jwt signed");
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }
}

impl TokenIssuer for JwtKeys {
    fn generate_access_token(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenError> {
        self.sign_with_kind(subject, TokenKind::Access)
    }

    fn generate_refresh_token(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenError> {
        self.sign_with_kind(subject, TokenKind::Refresh)
    }
}

impl<T: TokenIssuer> TokenIssuer for Traced<T> {
    fn generate_access_token(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenError> {
        let span = op_span!(
            "token.GenerateAccessToken",
            user_id = %subject.user_id,
            full_name = %subject.full_name
        );
        observe_sync(span, "access token generated", || {
            self.0.generate_access_token(subject)
        })
    }

    fn generate_refresh_token(&self, subject: &TokenSubject) -> Result<IssuedToken, TokenError> {
        let span = op_span!(
            "token.GenerateRefreshToken",
            user_id = %subject.user_id,
            full_name = %subject.full_name
        );
        observe_sync(span, "refresh token generated", || {
            self.0.generate_refresh_token(subject)
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    use super::*;

    pub const TEST_SECRET: &str = "test-secret";

    pub fn decode_claims(token: &str, secret: &str) -> Claims {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .expect("token should verify")
            .claims
    }
}
