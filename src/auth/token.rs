use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by both session tokens and password-reset credentials.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the account's unique identifier.
    pub sub: i32,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Stateless signed-token mint and verifier.
///
/// Constructed once at startup from explicit configuration and shared as
/// application data; there is no ambient secret. Session tokens are signed
/// with the process secret alone. Password-reset credentials are signed with
/// `secret || current password hash`, so rotating the password changes the
/// key and a credential can never validate twice against different hashes.
pub struct TokenIssuer {
    secret: Vec<u8>,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, session_ttl: Duration, reset_ttl: Duration) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            session_ttl,
            reset_ttl,
        }
    }

    /// Issues a session token for the given account id.
    pub fn issue(&self, account_id: i32) -> Result<String, AppError> {
        let expiration = (Utc::now() + self.session_ttl).timestamp() as usize;
        let claims = Claims {
            sub: account_id,
            exp: expiration,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AppError::Internal(format!("Failed to issue token: {}", e)))
    }

    /// Verifies a session token and returns the account id it names.
    ///
    /// Any failure (malformed, mis-signed, expired) collapses to the same
    /// `Unauthenticated` error so the caller cannot learn which check
    /// rejected the token.
    pub fn verify(&self, token: &str) -> Result<i32, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )?;
        Ok(data.claims.sub)
    }

    fn reset_key(&self, password_hash: &str) -> Vec<u8> {
        let mut key = self.secret.clone();
        key.extend_from_slice(password_hash.as_bytes());
        key
    }

    /// Issues a single-use, time-limited password-reset credential.
    pub fn issue_reset(&self, account_id: i32, password_hash: &str) -> Result<String, AppError> {
        let expiration = (Utc::now() + self.reset_ttl).timestamp() as usize;
        let claims = Claims {
            sub: account_id,
            exp: expiration,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.reset_key(password_hash)),
        )
        .map_err(|e| AppError::Internal(format!("Failed to issue reset credential: {}", e)))
    }

    /// Verifies a reset credential against the account's current password
    /// hash. A credential issued before a password change fails here because
    /// the derived key no longer matches.
    pub fn verify_reset(&self, token: &str, password_hash: &str) -> Result<i32, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.reset_key(password_hash)),
            &Validation::default(),
        )?;
        Ok(data.claims.sub)
    }

    /// Extracts the subject of a reset credential WITHOUT trusting it.
    ///
    /// The reset key is derived from the account's stored hash, so the
    /// account row has to be loaded before the signature can be checked.
    /// The returned id is only used for that lookup; `verify_reset` is the
    /// authority.
    pub fn peek_reset_subject(&self, token: &str) -> Result<i32, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims.sub)
    }
}
