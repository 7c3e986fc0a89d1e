/// Bearer token extraction from the `Authorization` header.

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;

pub const BEARER_SCHEME: &str = "Bearer";

/// Return the raw token from `Authorization: Bearer <token>`.
///
/// `None` when the header is missing, is not valid text, does not start
/// with `Bearer`, or has no non-empty second space-separated segment.
pub fn extract_bearer_token(req: &HttpRequest) -> Option<&str> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;

    if !header.starts_with(BEARER_SCHEME) {
        return None;
    }

    header.split(' ').nth(1).filter(|token| !token.is_empty())
}
