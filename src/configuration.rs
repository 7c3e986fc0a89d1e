use config::ConfigError;
use std::fmt;

use crate::auth::{MAX_SALT_ROUNDS, MIN_SALT_ROUNDS};

/// Fallback signing secrets used when neither the configuration file nor
/// the environment provides one. Predictable; startup warns when they are live.
pub const FALLBACK_USER_TOKEN_SECRET: &str = "USER_SECRET";
pub const FALLBACK_REFRESH_TOKEN_SECRET: &str = "REFRESH_SECRET";

pub const DEFAULT_SALT_ROUNDS: u32 = 10;
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 60 * 60;
pub const DEFAULT_REFRESH_TOKEN_EXPIRY: i64 = 24 * 60 * 60;

/// Environment variables that override keys from `configuration.yaml`.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PASSWORD_HASH_SALT_ROUNDS", "auth.password_hash_salt_rounds"),
    ("USER_TOKEN_SECRET", "auth.user_token_secret"),
    ("REFRESH_TOKEN_SECRET", "auth.refresh_token_secret"),
];

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_name", &self.database_name)
            .finish()
    }
}

/// Token and password hashing settings.
///
/// Fixed for the lifetime of the process: built once by
/// [`get_configuration`] and handed to [`crate::auth::AuthHelper`].
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    /// bcrypt cost factor
    pub password_hash_salt_rounds: u32,
    /// HMAC secret for access tokens
    pub user_token_secret: String,
    /// HMAC secret for refresh tokens
    pub refresh_token_secret: String,
    pub access_token_expiry: i64,  // seconds
    pub refresh_token_expiry: i64, // seconds
}

impl AuthSettings {
    /// True when either signing secret is still the built-in fallback.
    pub fn uses_fallback_secrets(&self) -> bool {
        self.user_token_secret == FALLBACK_USER_TOKEN_SECRET
            || self.refresh_token_secret == FALLBACK_REFRESH_TOKEN_SECRET
    }

    /// Reject values that would only fail later, on the first hash or token.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rounds = self.password_hash_salt_rounds;
        if !(MIN_SALT_ROUNDS..=MAX_SALT_ROUNDS).contains(&rounds) {
            return Err(ConfigError::Message(format!(
                "password_hash_salt_rounds must be between {} and {}, got {}",
                MIN_SALT_ROUNDS,
                MAX_SALT_ROUNDS,
                rounds
            )));
        }

        for (name, seconds) in [
            ("access_token_expiry", self.access_token_expiry),
            ("refresh_token_expiry", self.refresh_token_expiry),
        ] {
            if seconds <= 0 {
                return Err(ConfigError::Message(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, seconds
                )));
            }
        }

        Ok(())
    }

    /// Log a warning for secret setups that make tokens forgeable or
    /// interchangeable between the access and refresh kinds.
    pub fn warn_on_weak_secrets(&self) {
        if self.uses_fallback_secrets() {
            tracing::warn!(
                "Token signing is using a built-in fallback secret; set USER_TOKEN_SECRET and REFRESH_TOKEN_SECRET"
            );
        }
        if self.user_token_secret == self.refresh_token_secret {
            tracing::warn!("Access and refresh tokens share the same signing secret");
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("password_hash_salt_rounds", &self.password_hash_salt_rounds)
            .field("user_token_secret", &"[redacted]")
            .field("refresh_token_secret", &"[redacted]")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}

/// Load settings from `configuration.yaml` (optional) and the process environment.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = load_configuration(
        config::File::with_name("configuration").required(false),
        |name| std::env::var(name).ok(),
    )?;
    settings.auth.warn_on_weak_secrets();
    Ok(settings)
}

/// Build settings from defaults, then `file`, then the variables returned by `env`.
pub fn load_configuration<S, F>(file: S, env: F) -> Result<Settings, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    let mut builder = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000_i64)?
        .set_default("database.username", "postgres")?
        .set_default("database.password", "password")?
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432_i64)?
        .set_default("database.database_name", "authgate")?
        .set_default("auth.password_hash_salt_rounds", i64::from(DEFAULT_SALT_ROUNDS))?
        .set_default("auth.user_token_secret", FALLBACK_USER_TOKEN_SECRET)?
        .set_default("auth.refresh_token_secret", FALLBACK_REFRESH_TOKEN_SECRET)?
        .set_default("auth.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
        .set_default("auth.refresh_token_expiry", DEFAULT_REFRESH_TOKEN_EXPIRY)?
        .add_source(file);

    for &(var, key) in ENV_OVERRIDES {
        if let Some(value) = env(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    let settings = builder.build()?.try_deserialize::<Settings>()?;
    settings.auth.validate()?;
    Ok(settings)
}
