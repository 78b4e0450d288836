use crate::error::AppError;
use bcrypt::{hash, verify};

/// One-way transform for credentials. The cost is the bcrypt work factor;
/// callers take it from `Config` so it stays tunable per deployment.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Compares a candidate password against a stored hash.
///
/// A mismatch is `Ok(false)`, never an error; only a broken hash or a
/// primitive failure errors out.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
}
