//! Request identity extraction.
//!
//! Authentication lives in front of this service; requests arrive carrying
//! the already-verified identity in headers. `X-User-Role: admin` yields the
//! administrative capability, any other caller must present `X-User-Id`.
//! Collaborator services authenticate with the shared `X-Internal-Token`
//! secret instead.

use axum::http::HeaderMap;
use common::{Actor, UserId};

use crate::error::ApiError;

/// Identity headers set by the authenticating proxy.
pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Shared-secret header for collaborator-facing endpoints.
pub const INTERNAL_TOKEN_HEADER: &str = "X-Internal-Token";

/// Builds the acting capability from the identity headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    if let Some(role) = headers.get(USER_ROLE_HEADER).and_then(|v| v.to_str().ok())
        && role.eq_ignore_ascii_case("admin")
    {
        return Ok(Actor::Admin);
    }

    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Forbidden("identity headers missing".to_string()))?;

    let user_id: UserId = raw
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {USER_ID_HEADER} header")))?;
    Ok(Actor::customer(user_id))
}

/// Returns true if the request carries the shared internal token.
pub fn has_internal_token(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| token == expected)
}

/// Requires the shared internal token, yielding the internal capability.
pub fn require_internal(headers: &HeaderMap, expected: &str) -> Result<Actor, ApiError> {
    if has_internal_token(headers, expected) {
        Ok(Actor::Internal)
    } else {
        Err(ApiError::Forbidden("internal token required".to_string()))
    }
}
