// ============================
// backend-lib/src/auth/token.rs
// ============================
//! Signed, time-bounded access and refresh tokens.
//!
//! Both kinds share one claim shape and one HMAC secret; only their lifetime
//! differs. Validation looks at signature and expiry, nothing else; whether a
//! refresh token is still the live one is decided by the session cache.
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access token lifetime
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Refresh token lifetime
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Error, Debug)]
pub enum TokenError {
    /// Bad signature, malformed payload or expired; deliberately not distinguished
    #[error("invalid token")]
    Invalid,

    #[error("token signing secret is missing")]
    MissingSecret,

    #[error("token lifetime out of range")]
    Lifetime,

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id; keeps tokens issued within the same second distinct
    pub jti: String,
}

/// Stateless issuer/validator for HS256 tokens
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Create a token service; an empty secret is refused
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign a short-lived access token for `subject`
    pub fn issue_access(&self, subject: Uuid) -> Result<String, TokenError> {
        self.issue_at(subject, self.access_ttl, Utc::now())
    }

    /// Sign a long-lived refresh token; the caller registers it as live
    pub fn issue_refresh(&self, subject: Uuid) -> Result<String, TokenError> {
        self.issue_at(subject, self.refresh_ttl, Utc::now())
    }

    pub(crate) fn issue_at(&self, subject: Uuid, ttl: Duration, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or(TokenError::Lifetime)?;
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify signature and expiry and return the subject id
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims = self.claims(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Invalid)
    }

    /// Verified claims; any decoding, signature or expiry failure is `Invalid`
    pub(crate) fn claims(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}
