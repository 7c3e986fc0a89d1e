/// Authentication module
///
/// Password hashing, access/refresh token issuing and verification,
/// and bearer token extraction.

mod bearer;
mod claims;
mod helper;
mod jwt;
mod password;

pub use bearer::extract_bearer_token;
pub use bearer::BEARER_SCHEME;
pub use claims::Claims;
pub use helper::AuthHelper;
pub use helper::RefreshRequest;
pub use helper::TokenPair;
pub use jwt::decode_token;
pub use jwt::sign_token;
pub use jwt::sign_token_at;
pub use jwt::verify_token;
pub use password::hash_password;
pub use password::verify_password;
pub use password::{MAX_SALT_ROUNDS, MIN_SALT_ROUNDS};
