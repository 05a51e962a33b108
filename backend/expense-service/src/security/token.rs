//! Token issuance and verification.
//!
//! Two token kinds live here. Session tokens are stateless HS256 JWTs that
//! bind a subject id to a fixed validity horizon; verifying one never touches
//! storage. Single-use tokens (email verification, password reset) are opaque
//! random values persisted on the account next to their expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, Result};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (account id)
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
}

/// Why a session token failed verification. Callers collapse both kinds to
/// "unauthenticated"; the distinction exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Invalid,
    Expired,
}

#[derive(Clone)]
pub struct SessionTokenCodec {
    secret: String,
    ttl: Duration,
}

impl SessionTokenCodec {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Issue a session token for the subject, valid for the configured
    /// horizon from now.
    pub fn issue(&self, subject: Uuid) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|_| ApiError::Internal("Failed to sign session token".to_string()))?;

        Ok((token, expires_at))
    }

    /// Verify a session token and return its subject. Pure computation: no
    /// storage round-trip, expiry is evaluated by comparison at call time
    /// with zero leeway.
    pub fn verify(&self, token: &str) -> std::result::Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

/// Generate an opaque single-use token: 32 random bytes, hex encoded. The
/// 256 bits of entropy make collisions negligible, so no uniqueness check
/// against storage is performed.
pub fn generate_single_use_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Expiry for a single-use token issued at `now`.
pub fn single_use_expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now + ttl
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> SessionTokenCodec {
        SessionTokenCodec::new("test-secret", Duration::hours(24))
    }

    fn token_with_claims(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let codec = codec();
        let subject = Uuid::new_v4();

        let (token, expires_at) = codec.issue(subject).unwrap();

        assert!(expires_at > Utc::now() + Duration::hours(23));
        assert_eq!(codec.verify(&token), Ok(subject));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let codec = codec();
        let (token, _) = codec.issue(Uuid::new_v4()).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');

        assert_eq!(codec.verify(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let codec = codec();
        let other = SessionTokenCodec::new("other-secret", Duration::hours(24));
        let (token, _) = other.issue(Uuid::new_v4()).unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert_eq!(codec().verify("not.a.jwt"), Err(TokenError::Invalid));
        assert_eq!(codec().verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn token_inside_horizon_still_verifies() {
        // Issued 23h59m ago with a 24h horizon: one minute of validity left.
        let codec = codec();
        let subject = Uuid::new_v4();
        let now = Utc::now();
        let issued_at = now - Duration::hours(23) - Duration::minutes(59);
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(24)).timestamp(),
        };

        let token = token_with_claims(&claims, "test-secret");
        assert_eq!(codec.verify(&token), Ok(subject));
    }

    #[test]
    fn token_past_horizon_is_expired() {
        // Issued 24h01m ago with a 24h horizon: one minute past expiry.
        let codec = codec();
        let now = Utc::now();
        let issued_at = now - Duration::hours(24) - Duration::minutes(1);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(24)).timestamp(),
        };

        let token = token_with_claims(&claims, "test-secret");
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn malformed_subject_is_invalid() {
        let now = Utc::now();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let token = token_with_claims(&claims, "test-secret");
        assert_eq!(codec().verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn single_use_tokens_are_opaque_and_distinct() {
        let a = generate_single_use_token();
        let b = generate_single_use_token();

        assert_eq!(a.len(), 64); // 32 bytes, hex encoded
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn single_use_expiry_is_a_fixed_offset() {
        let now = Utc::now();
        let expiry = single_use_expiry(now, Duration::hours(1));
        assert_eq!(expiry - now, Duration::hours(1));
    }
}
