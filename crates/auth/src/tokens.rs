//! Signed session tokens and email verification proofs.
//!
//! Both are HS256 JWTs under the same secret. Verification proofs carry a
//! distinct audience and a `purpose` claim so neither kind is accepted in
//! place of the other.

use chrono::{DateTime, Duration, Utc};
use gatehouse_config::{AuthConfig, MAX_TTL_SECONDS};
use gatehouse_database::{Identity, Role};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AuthError;

pub const VERIFY_EMAIL_PURPOSE: &str = "verify-email";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity public id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub purpose: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub jti: String,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    session_ttl: Duration,
    verification_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            session_ttl: lifetime(config.session_ttl_seconds),
            verification_ttl: lifetime(config.verification_ttl_seconds),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn issue_session(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_session_at(identity, Utc::now())
    }

    pub fn issue_session_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = SessionClaims {
            sub: identity.public_id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            iat: issued_at.timestamp(),
            exp: expires_at(issued_at, self.session_ttl)?,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation(&self.audience))
            .map(|data| data.claims)
            .map_err(|err| {
                debug!(error = %err, "rejected session token");
                AuthError::InvalidOrExpiredProof
            })
    }

    pub fn issue_verification(&self, email: &str, role: Role) -> Result<String, AuthError> {
        self.issue_verification_at(email, role, Utc::now())
    }

    pub fn issue_verification_at(
        &self,
        email: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = VerificationClaims {
            purpose: VERIFY_EMAIL_PURPOSE.to_string(),
            email: email.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at(issued_at, self.verification_ttl)?,
            iss: self.issuer.clone(),
            aud: self.verification_audience(),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn verify_verification(&self, token: &str) -> Result<VerificationClaims, AuthError> {
        let claims = decode::<VerificationClaims>(
            token,
            &self.decoding_key,
            &self.validation(&self.verification_audience()),
        )
        .map(|data| data.claims)
        .map_err(|err| {
            debug!(error = %err, "rejected verification token");
            AuthError::InvalidOrExpiredProof
        })?;

        if claims.purpose != VERIFY_EMAIL_PURPOSE {
            return Err(AuthError::InvalidOrExpiredProof);
        }
        Ok(claims)
    }

    fn verification_audience(&self) -> String {
        format!("{}:{}", self.audience, VERIFY_EMAIL_PURPOSE)
    }

    fn validation(&self, audience: &str) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = 0;
        validation
    }
}

/// Lifetimes outside `1..=MAX_TTL_SECONDS` are clamped into range.
fn lifetime(seconds: u64) -> Duration {
    let seconds = seconds.clamp(1, MAX_TTL_SECONDS) as i64;
    Duration::try_seconds(seconds).unwrap_or_else(|| Duration::seconds(1))
}

fn expires_at(issued_at: DateTime<Utc>, ttl: Duration) -> Result<i64, AuthError> {
    issued_at
        .checked_add_signed(ttl)
        .map(|expiry| expiry.timestamp())
        .ok_or(AuthError::TokenLifetime)
}
