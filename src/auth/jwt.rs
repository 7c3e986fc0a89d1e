/// JWT Token Generation and Validation
///
/// Signs and verifies HS256 tokens carrying [`Claims`]. Expiry is checked
/// with zero leeway.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, TokenPayload};
use crate::error::{AppError, AuthError};

/// Sign `claims` with `secret`, expiring `lifetime_seconds` from now
///
/// # Errors
/// Returns error if token encoding fails
pub fn sign_token(claims: &Claims, secret: &str, lifetime_seconds: i64) -> Result<String, AppError> {
    sign_token_at(claims, secret, lifetime_seconds, chrono::Utc::now().timestamp())
}

/// Sign `claims` as if issued at `issued_at` (Unix timestamp)
pub fn sign_token_at(
    claims: &Claims,
    secret: &str,
    lifetime_seconds: i64,
    issued_at: i64,
) -> Result<String, AppError> {
    let payload = TokenPayload::new(claims.clone(), issued_at, lifetime_seconds)
        .ok_or_else(|| AppError::Internal("Token expiry out of range".to_string()))?;

    encode(
        &Header::new(Algorithm::HS256),
        &payload,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify `token` against `secret` and return its claims
///
/// The error names the cause so callers can log it; it must not reach clients.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<TokenPayload>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidSignature => AuthError::TokenInvalidSignature,
        _ => AuthError::TokenMalformed,
    })
}

/// Verify `token` against `secret`; any failure yields `None`
pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    match verify_token(token, secret) {
        Ok(claims) => Some(claims),
        Err(reason) => {
            tracing::debug!(reason = %reason, "Token rejected");
            None
        }
    }
}
