/// Middleware module
///
/// Custom middleware for authentication.

mod authenticate;

pub use authenticate::Authenticate;
