/// Authentication Routes
///
/// Registration, login, access token refresh and current identity.
/// Every authentication failure becomes the same 401 response.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthHelper, Claims, RefreshRequest, TokenPair, BEARER_SCHEME};
use crate::error::{AppError, AuthError, ErrorContext};
use crate::users::NewUser;
use crate::validators::{is_valid_password, is_valid_username};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// User login request. Missing fields fail authentication rather than parsing.
#[derive(Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Response carrying both tokens
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenPairResponse {
    fn new(tokens: TokenPair, expires_in: i64) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: BEARER_SCHEME.to_string(),
            expires_in,
        }
    }
}

/// Response to a refresh: a new access token only
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JSON extractor config for login and refresh.
///
/// A body that is missing, not JSON, or has wrongly typed fields fails
/// authentication with the same 401 as a wrong password.
pub fn credentials_json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "Unparseable credentials body");
        AppError::Auth(AuthError::NotAuthenticated).into()
    })
}

/// POST /auth/register
///
/// Create a non-admin user and return a token pair.
///
/// # Errors
/// - 400: Invalid username or password
/// - 409: Username already taken
pub async fn register(
    form: web::Json<RegisterRequest>,
    helper: web::Data<AuthHelper>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let username = is_valid_username(&form.username)?;
    is_valid_password(&form.password)?;
    let password_hash = helper.hash_password(&form.password)?;

    let user = helper
        .store()
        .create_user(NewUser {
            username,
            password_hash,
            is_admin: false,
        })
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    let tokens = helper.issue_tokens(&user)?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(TokenPairResponse::new(
        tokens,
        helper.settings().access_token_expiry,
    )))
}

/// POST /auth/login
///
/// # Errors
/// - 401: Unknown user, wrong password, missing fields or unparseable body (indistinguishable)
pub async fn login(
    form: web::Json<LoginRequest>,
    helper: web::Data<AuthHelper>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let (Some(username), Some(password)) = (form.username.as_deref(), form.password.as_deref())
    else {
        return Err(AuthError::NotAuthenticated.into());
    };

    let Some(user) = helper.verify_credentials(username, password).await else {
        let err = AppError::Auth(AuthError::NotAuthenticated);
        context.with_username(username).log_error(&err);
        return Err(err);
    };

    let tokens = helper.issue_tokens(&user)?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(TokenPairResponse::new(
        tokens,
        helper.settings().access_token_expiry,
    )))
}

/// POST /auth/refresh
///
/// Exchange `{"refreshToken": ...}` for a new access token. The refresh
/// token itself is not rotated.
///
/// # Errors
/// - 401: Missing, invalid, or expired refresh token, or unparseable body
pub async fn refresh(
    body: web::Json<RefreshRequest>,
    helper: web::Data<AuthHelper>,
) -> Result<HttpResponse, AppError> {
    let access_token = helper
        .refresh_access_token(&body)
        .ok_or(AppError::Auth(AuthError::NotAuthenticated))?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse {
        access_token,
        token_type: BEARER_SCHEME.to_string(),
        expires_in: helper.settings().access_token_expiry,
    }))
}

/// GET /auth/me
///
/// The claims the authentication middleware attached, or 401.
pub async fn current_user(claims: Option<web::ReqData<Claims>>) -> Result<HttpResponse, AppError> {
    let claims = claims.ok_or(AppError::Auth(AuthError::NotAuthenticated))?;
    Ok(HttpResponse::Ok().json(claims.into_inner()))
}
