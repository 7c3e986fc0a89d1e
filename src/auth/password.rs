/// Password Hashing and Verification
///
/// Thin wrapper over bcrypt. Input policy (length, charset) lives in
/// [`crate::validators`]; hashing itself accepts any string.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// Cost factor bounds accepted by bcrypt.
pub const MIN_SALT_ROUNDS: u32 = 4;
pub const MAX_SALT_ROUNDS: u32 = 31;

/// Hash a password using bcrypt with the given cost factor
///
/// # Errors
/// Returns error if bcrypt rejects the cost (outside 4..=31)
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error if the stored hash is not a valid bcrypt string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}
