use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{validate_claims, Claims, TokenError};

/// Bearer-token validation boundary.
///
/// Trait so the HTTP layer can be tested with a stub validator.
pub trait TokenValidator: Send + Sync {
    /// Verify the token signature and claim window against `now`, returning
    /// the claims on success.
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError>;
}

/// HS256 symmetric-key validator.
///
/// Time-window checks are done against the injected `now` (not the system
/// clock jsonwebtoken would use), so expiry behaviour is deterministic in
/// tests.
pub struct Hs256TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is checked by validate_claims with the injected clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenValidator for Hs256TokenValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
