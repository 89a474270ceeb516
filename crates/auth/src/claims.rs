use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pawmart_core::UserId;

/// JWT claims model (transport-agnostic).
///
/// The minimal set of claims this service expects once a token has been
/// decoded and its signature verified. Timestamps are unix seconds, as in
/// RFC 7519.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user.
    pub sub: UserId,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Expiration, unix seconds.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token rejected: {0}")]
    Invalid(String),
}

/// Deterministically validate the claim time window against `now`.
///
/// Signature verification happens before this, in the token validator; this
/// checks only the claims themselves, so it stays clock-injectable for tests.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}
