mod auth;
mod health_check;

pub use auth::{credentials_json_config, current_user, login, refresh, register};
pub use auth::{AccessTokenResponse, LoginRequest, RegisterRequest, TokenPairResponse};
pub use health_check::health_check;
