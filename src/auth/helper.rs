/// Authentication Helper
///
/// Translates between raw credentials or tokens and verified identity
/// claims. Every operation reports failure as `None` without saying why:
/// an unknown user, a wrong password, a missing header and a bad
/// signature all look the same to the caller.

use actix_web::{HttpMessage, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::bearer::extract_bearer_token;
use crate::auth::claims::Claims;
use crate::auth::jwt::{decode_token, sign_token};
use crate::auth::password::{hash_password, verify_password};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};
use crate::users::{UserRecord, UserStore};

/// Body of a token refresh request: `{"refreshToken": "..."}`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// An access token and a refresh token issued together
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthHelper {
    settings: AuthSettings,
    store: Arc<dyn UserStore>,
}

impl AuthHelper {
    pub fn new(settings: AuthSettings, store: Arc<dyn UserStore>) -> Self {
        Self { settings, store }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// Hash `plaintext` with the configured bcrypt cost
    pub fn hash_password(&self, plaintext: &str) -> Result<String, AppError> {
        hash_password(plaintext, self.settings.password_hash_salt_rounds)
    }

    /// Sign an access token. The caller is responsible for having validated the identity.
    pub fn generate_access_token(
        &self,
        username: &str,
        is_admin: bool,
        id: i64,
    ) -> Result<String, AppError> {
        sign_token(
            &Claims::new(username, is_admin, id),
            &self.settings.user_token_secret,
            self.settings.access_token_expiry,
        )
    }

    /// Sign a refresh token with the refresh secret and lifetime
    pub fn generate_refresh_token(
        &self,
        username: &str,
        is_admin: bool,
        id: i64,
    ) -> Result<String, AppError> {
        sign_token(
            &Claims::new(username, is_admin, id),
            &self.settings.refresh_token_secret,
            self.settings.refresh_token_expiry,
        )
    }

    /// Issue both tokens for an authenticated user
    pub fn issue_tokens(&self, user: &UserRecord) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(&user.username, user.is_admin, user.id)?,
            refresh_token: self.generate_refresh_token(&user.username, user.is_admin, user.id)?,
        })
    }

    /// Return the user when `password` matches the stored hash for `username`
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Option<UserRecord> {
        let user = match self.store.find_user_by_username(username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!(reason = %AuthError::LookupFailure, "Login rejected");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "User lookup failed during login");
                return None;
            }
        };

        match verify_password(password, &user.password_hash) {
            Ok(true) => Some(user),
            Ok(false) => {
                tracing::debug!(reason = %AuthError::CredentialMismatch, "Login rejected");
                None
            }
            Err(e) => {
                tracing::warn!(user_id = user.id, error = %e, "Stored password hash is unusable");
                None
            }
        }
    }

    /// Verify `token` against `secret`
    pub fn decode_token(&self, token: &str, secret: &str) -> Option<Claims> {
        decode_token(token, secret)
    }

    /// Claims from a valid access token in the `Authorization` header
    pub fn check_bearer_token(&self, req: &HttpRequest) -> Option<Claims> {
        let Some(token) = extract_bearer_token(req) else {
            tracing::debug!(reason = %AuthError::TokenMissing, "No bearer token");
            return None;
        };
        self.decode_token(token, &self.settings.user_token_secret)
    }

    /// Exchange a valid refresh token for a new access token with the same claims
    pub fn refresh_access_token(&self, body: &RefreshRequest) -> Option<String> {
        let token = body.refresh_token.as_deref().filter(|t| !t.is_empty())?;
        let claims = self.decode_token(token, &self.settings.refresh_token_secret)?;

        match self.generate_access_token(&claims.username, claims.is_admin, claims.id) {
            Ok(access_token) => Some(access_token),
            Err(e) => {
                tracing::error!(error = %e, "Failed to re-issue access token");
                None
            }
        }
    }

    /// Attach the bearer token's claims to the request extensions.
    ///
    /// Returns whether an identity was attached. A request without a valid
    /// token is left untouched; rejecting it is up to the handler.
    pub fn authenticate(&self, req: &HttpRequest) -> bool {
        match self.check_bearer_token(req) {
            Some(claims) => {
                req.extensions_mut().insert(claims);
                true
            }
            None => false,
        }
    }
}
