use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Only `sub` is inspected after the signature and expiry checks; its type is
/// checked by hand so that a non-string subject is an authentication failure.
#[derive(Debug, Deserialize)]
struct VerifiedClaims {
    sub: Option<serde_json::Value>,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expiry: DateTime<Utc>,
}

/// Issues and verifies HS256 bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expiry = now + self.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))?;
        Ok(IssuedToken { token, expiry })
    }

    /// Verifies `token` and returns its subject.
    ///
    /// Every defect of the token itself (bad signature, expired, malformed,
    /// missing or non-string `sub`) is the same `InvalidToken`. Anything else
    /// is an internal failure.
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<VerifiedClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidToken
                | ErrorKind::ExpiredSignature
                | ErrorKind::ImmatureSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidSubject
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AppError::InvalidToken,
                _ => AppError::Internal(format!("token verification failed: {e}")),
            }
        })?;

        match data.claims.sub {
            Some(serde_json::Value::String(sub)) => Ok(sub),
            _ => Err(AppError::InvalidToken),
        }
    }
}
