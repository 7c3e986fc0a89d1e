/// Identity claims carried inside access and refresh tokens.

use serde::{Deserialize, Serialize};

use crate::users::UserRecord;

/// The identity payload embedded in every token.
///
/// Serialized as `{"username", "isAdmin", "id"}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    pub is_admin: bool,
    pub id: i64,
}

impl Claims {
    pub fn new(username: impl Into<String>, is_admin: bool, id: i64) -> Self {
        Self {
            username: username.into(),
            is_admin,
            id,
        }
    }
}

impl From<&UserRecord> for Claims {
    fn from(user: &UserRecord) -> Self {
        Self::new(user.username.clone(), user.is_admin, user.id)
    }
}

/// Full token payload: the identity claims plus registered time claims.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenPayload {
    #[serde(flatten)]
    pub claims: Claims,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenPayload {
    /// `None` when the expiry does not fit in an `i64`.
    pub fn new(claims: Claims, issued_at: i64, lifetime_seconds: i64) -> Option<Self> {
        Some(Self {
            claims,
            iat: issued_at,
            exp: issued_at.checked_add(lifetime_seconds)?,
        })
    }
}
